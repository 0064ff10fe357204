use indexmap::IndexMap;

/// Parsed reply of the `INFO` command.
///
/// The text is a list of `# Section` headers, each followed by
/// `field:value` lines. Fields before the first header land in a section
/// named `default`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerInfo {
    sections: IndexMap<String, IndexMap<String, String>>,
}

impl ServerInfo {
    pub fn parse(text: &str) -> ServerInfo {
        let mut sections: IndexMap<String, IndexMap<String, String>> = IndexMap::new();
        let mut current = "default".to_string();

        for line in text.lines().map(str::trim) {
            if line.is_empty() {
                continue;
            }
            if let Some(header) = line.strip_prefix('#') {
                current = header.trim().to_lowercase();
                sections.entry(current.clone()).or_default();
                continue;
            }
            if let Some((field, value)) = line.split_once(':') {
                sections
                    .entry(current.clone())
                    .or_default()
                    .insert(field.to_string(), value.to_string());
            }
        }
        ServerInfo { sections }
    }

    /// Server version, read from `redis_version` or `version`.
    pub fn version(&self) -> Option<&str> {
        self.find("redis_version").or_else(|| self.find("version"))
    }

    /// Looks up a field in a section. Section names are case-insensitive.
    pub fn get(&self, section: &str, field: &str) -> Option<&str> {
        self.sections
            .get(&section.to_lowercase())
            .and_then(|fields| fields.get(field))
            .map(String::as_str)
    }

    /// Looks up a field in whichever section holds it first.
    pub fn find(&self, field: &str) -> Option<&str> {
        self.sections
            .values()
            .find_map(|fields| fields.get(field))
            .map(String::as_str)
    }

    pub fn section(&self, section: &str) -> Option<&IndexMap<String, String>> {
        self.sections.get(&section.to_lowercase())
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.sections.keys().map(String::as_str).collect()
    }
}

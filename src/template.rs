//! Minimal `{{ .name }}` text templates.
//!
//! Only field substitution is supported; any other action is rejected when the
//! template is compiled.

use serde_json::{Map, Value};

/// Errors raised while compiling or rendering a template.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// The template text is malformed
    Parse { position: usize, message: String },

    /// A placeholder names a field with no value
    Unresolved(String),
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateError::Parse { position, message } => {
                write!(f, "template parse error at byte {}: {}", position, message)
            }
            TemplateError::Unresolved(name) => {
                write!(f, "template field '{}' has no value", name)
            }
        }
    }
}

impl std::error::Error for TemplateError {}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A compiled template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Compile template text.
    ///
    /// # Errors
    ///
    /// Returns `Parse` for an unclosed `{{`, an action that is not `.name`,
    /// or an empty field name.
    pub fn compile(text: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = text;
        let mut offset = 0;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }

            let after_open = &rest[open + 2..];
            let close = after_open.find("}}").ok_or_else(|| TemplateError::Parse {
                position: offset + open,
                message: "unclosed action".to_string(),
            })?;

            let action = after_open[..close].trim();
            let name = action
                .strip_prefix('.')
                .filter(|name| is_identifier(name))
                .ok_or_else(|| TemplateError::Parse {
                    position: offset + open,
                    message: format!("unsupported action '{}'", action),
                })?;
            segments.push(Segment::Field(name.to_string()));

            let consumed = open + 2 + close + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    /// Names referenced by the template, in order of appearance.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Render the template into `out`.
    ///
    /// Strings are inserted verbatim, other values in their JSON text form.
    pub fn render_into(
        &self,
        values: &Map<String, Value>,
        out: &mut Vec<u8>,
    ) -> Result<(), TemplateError> {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.extend_from_slice(text.as_bytes()),
                Segment::Field(name) => match values.get(name) {
                    Some(Value::String(s)) => out.extend_from_slice(s.as_bytes()),
                    Some(Value::Null) => {}
                    Some(other) => out.extend_from_slice(other.to_string().as_bytes()),
                    None => return Err(TemplateError::Unresolved(name.clone())),
                },
            }
        }

        Ok(())
    }

    pub fn render(&self, values: &Map<String, Value>) -> Result<String, TemplateError> {
        let mut out = Vec::new();
        self.render_into(values, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("values must be an object"),
        }
    }

    #[test]
    fn test_substitution() {
        let t = Template::compile("{{ .host }} - [{{ .timestamp}}] {{.code}}").unwrap();
        let out = t
            .render(&values(json!({"host": "10.0.0.1", "timestamp": "now", "code": 200})))
            .unwrap();
        assert_eq!(out, "10.0.0.1 - [now] 200");
    }

    #[test]
    fn test_fields_in_order() {
        let t = Template::compile("<{{ .priority }}>{{ .host }} {{ .priority }}").unwrap();
        assert_eq!(t.fields().collect::<Vec<_>>(), vec!["priority", "host", "priority"]);
    }

    #[test]
    fn test_unresolved_field() {
        let t = Template::compile("{{ .missing }}").unwrap();
        let err = t.render(&Map::new()).unwrap_err();
        assert_eq!(err, TemplateError::Unresolved("missing".to_string()));
    }

    #[test]
    fn test_parse_errors() {
        for text in ["{{ .host", "{{ host }}", "{{ . }}", "{{ .a.b }}", "{{ if .x }}"] {
            assert!(
                matches!(Template::compile(text), Err(TemplateError::Parse { .. })),
                "{} should not compile",
                text
            );
        }
    }

    #[test]
    fn test_plain_text() {
        let t = Template::compile("no fields here").unwrap();
        assert_eq!(t.render(&Map::new()).unwrap(), "no fields here");
        assert_eq!(t.fields().count(), 0);
    }
}

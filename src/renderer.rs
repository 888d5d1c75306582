//! Token evaluation and record rendering.
//!
//! A [`Renderer`] owns the compiled tokens of one log shape. Rendering a
//! record resolves every token into a flat name to value map, merges the
//! caller's overrides on top, and writes the map either as a JSON object or
//! through a text template.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::faker::{FakeError, FakeKind, Options, Provider};
use crate::formats::{LogFormat, TIMESTAMP};
use crate::template::{Template, TemplateError};
use crate::timestamp::TimestampStyle;

/// A token as written in the configuration.
///
/// Exactly one of `kind` and `value` must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FakeKind>,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub options: Options,

    /// Literal value used verbatim instead of a provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Key to emit instead of `name` in structured output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// Errors raised while building or rendering records.
#[derive(Debug)]
pub enum RenderError {
    /// A token's value provider rejected its options
    ValueGenerationFailed { token: String, source: FakeError },

    /// A token has neither a kind nor a literal value, or has both
    InvalidToken { token: String, message: String },

    /// Two tokens share a name
    DuplicateToken(String),

    Template(TemplateError),

    Encode(serde_json::Error),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::ValueGenerationFailed { token, source } => {
                write!(f, "failed to generate value for token '{}': {}", token, source)
            }
            RenderError::InvalidToken { token, message } => {
                write!(f, "invalid token '{}': {}", token, message)
            }
            RenderError::DuplicateToken(name) => write!(f, "duplicate token '{}'", name),
            RenderError::Template(e) => write!(f, "{}", e),
            RenderError::Encode(e) => write!(f, "failed to encode record: {}", e),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::ValueGenerationFailed { source, .. } => Some(source),
            RenderError::Template(e) => Some(e),
            RenderError::Encode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TemplateError> for RenderError {
    fn from(err: TemplateError) -> Self {
        RenderError::Template(err)
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::Encode(err)
    }
}

#[derive(Debug, Clone)]
enum TokenSource {
    Literal(Value),
    Fake(Provider),
}

/// A token with its provider compiled.
#[derive(Debug, Clone)]
pub struct Token {
    name: String,
    source: TokenSource,
    display: Option<String>,
}

impl Token {
    /// Compile a configured token.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` unless exactly one of `kind`/`value` is set, and
    /// `ValueGenerationFailed` if the provider rejects the options.
    pub fn compile(spec: &TokenSpec) -> Result<Self, RenderError> {
        let invalid = |message: &str| RenderError::InvalidToken {
            token: spec.name.clone(),
            message: message.to_string(),
        };

        if spec.name.is_empty() {
            return Err(invalid("name is required"));
        }

        let source = match (&spec.value, spec.kind) {
            (Some(value), None) => TokenSource::Literal(value.clone()),
            (None, Some(kind)) => {
                let provider = Provider::new(kind, &spec.options).map_err(|source| {
                    RenderError::ValueGenerationFailed {
                        token: spec.name.clone(),
                        source,
                    }
                })?;
                TokenSource::Fake(provider)
            }
            (Some(_), Some(_)) => return Err(invalid("kind and value are exclusive")),
            (None, None) => return Err(invalid("one of kind or value is required")),
        };

        Ok(Self {
            name: spec.name.clone(),
            source,
            display: spec.display.clone().filter(|d| !d.is_empty()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display(&self) -> Option<&str> {
        self.display.as_deref()
    }

    /// Resolve the token to a value.
    pub fn value<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        match &self.source {
            TokenSource::Literal(value) => value.clone(),
            TokenSource::Fake(provider) => provider.generate(rng),
        }
    }
}

/// How a resolved token map is written out.
#[derive(Debug, Clone)]
pub enum Format {
    /// A JSON object, keys renamed by each token's display name
    Structured,

    /// A text template, with the tokens of a built-in format resolved first
    Templated {
        template: Template,
        builtin_tokens: Vec<Token>,
        timestamp_style: Option<TimestampStyle>,
    },
}

impl Format {
    /// Pick the output format.
    ///
    /// A custom template wins over the named format's template, but the named
    /// format still contributes its tokens and timestamp style. Without
    /// either, records are JSON.
    pub fn new(kind: Option<LogFormat>, custom: Option<&str>) -> Result<Self, RenderError> {
        if kind == Some(LogFormat::Json) {
            return Ok(Format::Structured);
        }

        let builtin = kind.and_then(|k| k.builtin());
        let custom = custom.filter(|c| !c.is_empty());

        let text = match custom.or(builtin.as_ref().map(|b| b.template)) {
            Some(text) => text,
            None => return Ok(Format::Structured),
        };

        let (builtin_tokens, timestamp_style) = match &builtin {
            Some(b) => (
                b.tokens.iter().map(Token::compile).collect::<Result<_, _>>()?,
                Some(b.timestamp_style),
            ),
            None => (Vec::new(), None),
        };

        Ok(Format::Templated {
            template: Template::compile(text)?,
            builtin_tokens,
            timestamp_style,
        })
    }

    /// The timestamp style a built-in format is written with, if any.
    pub fn default_timestamp_style(&self) -> Option<TimestampStyle> {
        match self {
            Format::Structured => None,
            Format::Templated {
                timestamp_style, ..
            } => *timestamp_style,
        }
    }
}

/// Render one record from `tokens` and `overrides` in `format`.
///
/// Values are merged in order: built-in format tokens, then `tokens`, then
/// `overrides`; later entries replace earlier ones of the same name.
pub fn render<R: Rng + ?Sized>(
    tokens: &[Token],
    overrides: &Map<String, Value>,
    format: &Format,
    rng: &mut R,
) -> Result<Vec<u8>, RenderError> {
    let mut out = Vec::new();
    render_into(tokens, overrides, format, rng, &mut out)?;
    Ok(out)
}

/// Like [`render`], appending to `out`.
pub fn render_into<R: Rng + ?Sized>(
    tokens: &[Token],
    overrides: &Map<String, Value>,
    format: &Format,
    rng: &mut R,
    out: &mut Vec<u8>,
) -> Result<(), RenderError> {
    let mut values = Map::new();

    if let Format::Templated { builtin_tokens, .. } = format {
        for token in builtin_tokens {
            values.insert(token.name.clone(), token.value(rng));
        }
    }

    for token in tokens {
        values.insert(token.name.clone(), token.value(rng));
    }

    for (key, value) in overrides {
        values.insert(key.clone(), value.clone());
    }

    match format {
        Format::Structured => {
            for token in tokens {
                if let Some(display) = &token.display {
                    if let Some(value) = values.remove(&token.name) {
                        values.insert(display.clone(), value);
                    }
                }
            }
            serde_json::to_writer(&mut *out, &values)?;
        }
        Format::Templated { template, .. } => template.render_into(&values, out)?,
    }

    Ok(())
}

/// Compiled tokens and output format of one log shape.
#[derive(Debug, Clone)]
pub struct Renderer {
    tokens: Vec<Token>,
    format: Format,
}

impl Renderer {
    /// Compile the tokens and check that every template field can be filled.
    ///
    /// `timestamp` is always considered available since it is injected per
    /// record.
    pub fn new(specs: &[TokenSpec], format: Format) -> Result<Self, RenderError> {
        let mut tokens: Vec<Token> = Vec::with_capacity(specs.len());
        for spec in specs {
            if tokens.iter().any(|t| t.name == spec.name) {
                return Err(RenderError::DuplicateToken(spec.name.clone()));
            }
            tokens.push(Token::compile(spec)?);
        }

        if let Format::Templated {
            template,
            builtin_tokens,
            ..
        } = &format
        {
            let known = |name: &str| {
                name == TIMESTAMP
                    || tokens.iter().any(|t| t.name == name)
                    || builtin_tokens.iter().any(|t| t.name == name)
            };

            if let Some(missing) = template.fields().find(|f| !known(f)) {
                return Err(TemplateError::Unresolved(missing.to_string()).into());
            }
        }

        Ok(Self { tokens, format })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    /// Render one record, without a trailing newline, onto `out`.
    pub fn render_into<R: Rng + ?Sized>(
        &self,
        overrides: &Map<String, Value>,
        rng: &mut R,
        out: &mut Vec<u8>,
    ) -> Result<(), RenderError> {
        render_into(&self.tokens, overrides, &self.format, rng, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn literal(name: &str, value: Value) -> TokenSpec {
        TokenSpec {
            name: name.to_string(),
            value: Some(value),
            ..Default::default()
        }
    }

    fn timestamp(value: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(formats::TIMESTAMP.to_string(), json!(value));
        map
    }

    #[test]
    fn test_combined_log_shape() {
        let specs = vec![
            literal(formats::HOST, json!("192.168.1.10")),
            literal(formats::USER_ID, json!("Smith1234")),
            literal(formats::HTTP_METHOD, json!("GET")),
            literal(formats::HTTP_URL, json!("/index.html")),
            literal(formats::HTTP_VERSION, json!("HTTP/1.1")),
            literal(formats::HTTP_STATUS_CODE, json!(200)),
            literal(formats::HTTP_CONTENT_LENGTH, json!(5120)),
            literal(formats::REFERER, json!("https://www.example.com/")),
            literal(formats::HTTP_USER_AGENT, json!("curl/8.0")),
        ];

        let format = Format::new(Some(LogFormat::ApacheCombined), None).unwrap();
        let renderer = Renderer::new(&specs, format).unwrap();

        let mut out = Vec::new();
        renderer
            .render_into(
                &timestamp("23/Mar/2025:00:00:00 +0000"),
                &mut StdRng::seed_from_u64(1),
                &mut out,
            )
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"192.168.1.10 - Smith1234 [23/Mar/2025:00:00:00 +0000] "GET /index.html HTTP/1.1" 200 5120 "https://www.example.com/" "curl/8.0""#
        );
    }

    #[test]
    fn test_structured_renames_display() {
        let mut level = literal("level", json!("info"));
        level.display = Some("severity".to_string());
        let specs = vec![level, literal("count", json!(3))];

        let renderer = Renderer::new(&specs, Format::Structured).unwrap();
        let mut out = Vec::new();
        renderer
            .render_into(&timestamp("now"), &mut StdRng::seed_from_u64(1), &mut out)
            .unwrap();

        let record: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            record,
            json!({"severity": "info", "count": 3, "timestamp": "now"})
        );
    }

    #[test]
    fn test_overrides_take_precedence() {
        let specs = vec![literal(formats::TIMESTAMP, json!("from token"))];
        let format = Format::new(None, Some("{{ .timestamp }}")).unwrap();

        let out = render(
            &Renderer::new(&specs, format.clone()).unwrap().tokens,
            &timestamp("from override"),
            &format,
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap();
        assert_eq!(out, b"from override");
    }

    #[test]
    fn test_user_token_overrides_builtin() {
        let specs = vec![literal(formats::HOST, json!("fixed-host"))];
        let format = Format::new(Some(LogFormat::Rfc3164), None).unwrap();
        let renderer = Renderer::new(&specs, format).unwrap();

        let mut out = Vec::new();
        renderer
            .render_into(&timestamp("Mar 23 00:00:00"), &mut StdRng::seed_from_u64(1), &mut out)
            .unwrap();

        let line = String::from_utf8(out).unwrap();
        assert!(line.contains("Mar 23 00:00:00 fixed-host "), "{}", line);
    }

    #[test]
    fn test_custom_template_with_builtin_tokens() {
        let format = Format::new(Some(LogFormat::ApacheError), Some("{{ .pid }}|{{ .tid }}")).unwrap();
        assert_eq!(
            format.default_timestamp_style(),
            Some(TimestampStyle::ApacheError)
        );

        let renderer = Renderer::new(&[], format).unwrap();
        let mut out = Vec::new();
        renderer
            .render_into(&Map::new(), &mut StdRng::seed_from_u64(1), &mut out)
            .unwrap();

        let line = String::from_utf8(out).unwrap();
        let (pid, tid) = line.split_once('|').unwrap();
        assert!(pid.parse::<u32>().is_ok());
        assert!(tid.parse::<u32>().is_ok());
    }

    #[test]
    fn test_unknown_template_field_rejected_up_front() {
        let format = Format::new(None, Some("{{ .nope }}")).unwrap();
        let err = Renderer::new(&[], format).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Template(TemplateError::Unresolved(ref name)) if name == "nope"
        ));
    }

    #[test]
    fn test_invalid_tokens() {
        let neither = TokenSpec {
            name: "x".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Token::compile(&neither),
            Err(RenderError::InvalidToken { .. })
        ));

        let both = TokenSpec {
            name: "x".to_string(),
            kind: Some(FakeKind::Ipv4),
            value: Some(json!("1.2.3.4")),
            ..Default::default()
        };
        assert!(matches!(
            Token::compile(&both),
            Err(RenderError::InvalidToken { .. })
        ));

        let mut options = Options::new();
        options.insert("min".to_string(), json!("ten"));
        let bad_options = TokenSpec {
            name: "n".to_string(),
            kind: Some(FakeKind::Number),
            options,
            ..Default::default()
        };
        match Token::compile(&bad_options) {
            Err(RenderError::ValueGenerationFailed { token, .. }) => assert_eq!(token, "n"),
            other => panic!("unexpected result: {:?}", other),
        }

        let dup = vec![literal("a", json!(1)), literal("a", json!(2))];
        assert!(matches!(
            Renderer::new(&dup, Format::Structured),
            Err(RenderError::DuplicateToken(_))
        ));
    }

    #[test]
    fn test_json_format_is_structured() {
        assert!(matches!(
            Format::new(Some(LogFormat::Json), Some("{{ .x }}")).unwrap(),
            Format::Structured
        ));
        assert!(matches!(Format::new(None, None).unwrap(), Format::Structured));
    }
}

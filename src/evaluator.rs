//! Attribute evaluators: turn a shape's fields into the JSON payload stored
//! under `data[key]`.

use crate::error::GridError;
use crate::types::Shape;

/// Produces the pre-formatted payload for a shape. The returned text is
/// embedded verbatim in the output, so it must be a valid JSON value.
pub trait AttributeEvaluator {
    fn evaluate(&self, shape: &Shape) -> Result<String, GridError>;
}

impl<F> AttributeEvaluator for F
where
    F: Fn(&Shape) -> Result<String, GridError>,
{
    fn evaluate(&self, shape: &Shape) -> Result<String, GridError> {
        self(shape)
    }
}

/// Emits a JSON object of the shape's fields, either all of them (by name) or
/// a chosen list (in list order). Missing fields are emitted as `""`.
#[derive(Debug, Clone, Default)]
pub struct FieldsEvaluator {
    fields: Option<Vec<String>>,
}

impl FieldsEvaluator {
    pub fn all() -> Self {
        Self { fields: None }
    }

    pub fn select(fields: Vec<String>) -> Self {
        Self {
            fields: Some(fields),
        }
    }
}

impl AttributeEvaluator for FieldsEvaluator {
    fn evaluate(&self, shape: &Shape) -> Result<String, GridError> {
        let mut out = String::from("{");
        let mut push = |name: &str, value: &str| -> Result<(), GridError> {
            if out.len() > 1 {
                out.push(',');
            }
            out.push_str(&serde_json::to_string(name)?);
            out.push(':');
            out.push_str(&serde_json::to_string(value)?);
            Ok(())
        };
        match &self.fields {
            None => {
                for (name, value) in &shape.fields {
                    push(name, value)?;
                }
            }
            Some(names) => {
                for name in names {
                    push(name, shape.field(name).unwrap_or_default())?;
                }
            }
        }
        out.push('}');
        Ok(out)
    }
}

/// A text template with `[FIELD]` placeholders, e.g.
/// `{"name":"[NAME]","pop":[POP]}`. Field values are JSON-escaped before
/// substitution; the surrounding template text is copied as is. Brackets
/// that do not name a field of the shape, such as array literals, are kept
/// literally. A result that is not valid JSON is an error.
#[derive(Debug, Clone)]
pub struct TemplateEvaluator {
    template: String,
}

impl TemplateEvaluator {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl AttributeEvaluator for TemplateEvaluator {
    fn evaluate(&self, shape: &Shape) -> Result<String, GridError> {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('[') {
            out.push_str(&rest[..open]);
            let tail = &rest[open + 1..];
            let Some(close) = tail.find(']') else {
                out.push_str(&rest[open..]);
                rest = "";
                break;
            };
            let name = &tail[..close];
            match shape.field(name) {
                Some(value) => {
                    out.push_str(&escape_json_text(value)?);
                    rest = &tail[close + 1..];
                }
                None => {
                    // Not a placeholder; copy the `[` and rescan after it.
                    out.push('[');
                    rest = tail;
                }
            }
        }
        out.push_str(rest);
        serde_json::from_str::<serde::de::IgnoredAny>(&out)
            .map_err(|e| GridError::Evaluator(format!("template produced invalid JSON ({e}): {out}")))?;
        Ok(out)
    }
}

/// JSON-escape `value` without the surrounding quotes.
fn escape_json_text(value: &str) -> Result<String, GridError> {
    let quoted = serde_json::to_string(value)?;
    Ok(quoted[1..quoted.len() - 1].to_string())
}

use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Filter clause '{0}' is missing ':'")]
    MissingSeparator(String),
    #[error("Filter clause '{0}' has an empty field")]
    EmptyField(String),
    #[error("Filter clause '{0}' has an unterminated quote")]
    UnterminatedQuote(String),
}

/// A single `field:value` comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    pub field: String,
    pub value: String,
}

/// A conjunction of equality clauses, written `status:active+name:'Spring sale'`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferFilter {
    clauses: Vec<FilterClause>,
}

impl OfferFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.clauses.push(FilterClause { field: field.into(), value: value.into() });
        self
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn parse(input: &str) -> Result<Self, FilterError> {
        let mut filter = Self::new();
        let input = input.trim();
        if input.is_empty() {
            return Ok(filter);
        }

        for raw in split_clauses(input)? {
            let (field, value) = raw
                .split_once(':')
                .ok_or_else(|| FilterError::MissingSeparator(raw.clone()))?;
            let field = field.trim();
            if field.is_empty() {
                return Err(FilterError::EmptyField(raw.clone()));
            }
            let value = value.trim();
            let value = value
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
                .unwrap_or(value);
            filter = filter.and(field, value);
        }

        Ok(filter)
    }
}

// '+' inside single quotes belongs to the value.
fn split_clauses(input: &str) -> Result<Vec<String>, FilterError> {
    let mut clauses = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in input.chars() {
        match c {
            '\'' => {
                quoted = !quoted;
                current.push(c);
            }
            '+' if !quoted => {
                clauses.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if quoted {
        return Err(FilterError::UnterminatedQuote(current));
    }
    clauses.push(current);

    Ok(clauses)
}

impl fmt::Display for OfferFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .clauses
            .iter()
            .map(|c| {
                if c.value.contains(['+', ' ', ':']) {
                    format!("{}:'{}'", c.field, c.value)
                } else {
                    format!("{}:{}", c.field, c.value)
                }
            })
            .collect::<Vec<String>>()
            .join("+");
        write!(f, "{}", rendered)
    }
}

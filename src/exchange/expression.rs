//! Correlation-key expressions.

use std::fmt;
use std::str::FromStr;

use super::Exchange;

/// Failure to derive a correlation key from an exchange.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionKeyError {
    #[error("header '{header}' is not set on exchange {exchange_id}")]
    MissingHeader { header: String, exchange_id: String },

    #[error("body of exchange {exchange_id} is empty")]
    EmptyBody { exchange_id: String },

    #[error("body of exchange {exchange_id} is not valid UTF-8")]
    InvalidBody { exchange_id: String },
}

/// Where a correlation key is read from.
///
/// Parsed from `header:<name>`, `${header.<name>}`, `body`, `${body}`, `id`
/// or `${exchangeId}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyExpression {
    Header(String),
    Body,
    ExchangeId,
}

impl KeyExpression {
    /// Evaluate the expression against an exchange.
    pub fn evaluate(&self, exchange: &Exchange) -> Result<String, SelectionKeyError> {
        match self {
            KeyExpression::Header(name) => exchange
                .header(name)
                .map(str::to_string)
                .ok_or_else(|| SelectionKeyError::MissingHeader {
                    header: name.clone(),
                    exchange_id: exchange.id().to_string(),
                }),
            KeyExpression::Body => {
                if exchange.body().is_empty() {
                    return Err(SelectionKeyError::EmptyBody {
                        exchange_id: exchange.id().to_string(),
                    });
                }
                std::str::from_utf8(exchange.body())
                    .map(str::to_string)
                    .map_err(|_| SelectionKeyError::InvalidBody {
                        exchange_id: exchange.id().to_string(),
                    })
            }
            KeyExpression::ExchangeId => Ok(exchange.id().to_string()),
        }
    }
}

impl FromStr for KeyExpression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let inner = s
            .strip_prefix("${")
            .and_then(|rest| rest.strip_suffix('}'))
            .map(str::trim);

        let header = match inner {
            Some(inner) => inner.strip_prefix("header."),
            None => s.strip_prefix("header:"),
        };
        if let Some(name) = header {
            let name = name.trim();
            if name.is_empty() {
                return Err(format!("Missing header name in expression: {}", s));
            }
            return Ok(KeyExpression::Header(name.to_string()));
        }

        match inner.unwrap_or(s) {
            "body" => Ok(KeyExpression::Body),
            "id" | "exchangeId" => Ok(KeyExpression::ExchangeId),
            _ => Err(format!("Unknown key expression: {}", s)),
        }
    }
}

impl fmt::Display for KeyExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyExpression::Header(name) => write!(f, "header:{}", name),
            KeyExpression::Body => write!(f, "body"),
            KeyExpression::ExchangeId => write!(f, "id"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_forms() {
        assert_eq!(
            "header:user".parse::<KeyExpression>().unwrap(),
            KeyExpression::Header("user".to_string())
        );
        assert_eq!(
            "${header.user}".parse::<KeyExpression>().unwrap(),
            KeyExpression::Header("user".to_string())
        );
    }

    #[test]
    fn test_parse_body_and_id() {
        assert_eq!("body".parse::<KeyExpression>().unwrap(), KeyExpression::Body);
        assert_eq!("${body}".parse::<KeyExpression>().unwrap(), KeyExpression::Body);
        assert_eq!("id".parse::<KeyExpression>().unwrap(), KeyExpression::ExchangeId);
        assert_eq!(
            "${exchangeId}".parse::<KeyExpression>().unwrap(),
            KeyExpression::ExchangeId
        );
    }

    #[test]
    fn test_parse_rejects_unknown_and_blank_header() {
        assert!("header:".parse::<KeyExpression>().is_err());
        assert!("${header.}".parse::<KeyExpression>().is_err());
        assert!("cookie:x".parse::<KeyExpression>().is_err());
        assert!("".parse::<KeyExpression>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for expr in ["header:user", "body", "id"] {
            let parsed: KeyExpression = expr.parse().unwrap();
            assert_eq!(parsed.to_string(), expr);
        }
    }

    #[test]
    fn test_evaluate_header() {
        let exchange = Exchange::with_id("ex-1").with_header("user", "alice");
        let expr = KeyExpression::Header("user".to_string());
        assert_eq!(expr.evaluate(&exchange).unwrap(), "alice");
    }

    #[test]
    fn test_evaluate_missing_header_fails() {
        let exchange = Exchange::with_id("ex-1");
        let err = KeyExpression::Header("user".to_string())
            .evaluate(&exchange)
            .unwrap_err();
        assert_eq!(
            err,
            SelectionKeyError::MissingHeader {
                header: "user".to_string(),
                exchange_id: "ex-1".to_string(),
            }
        );
    }

    #[test]
    fn test_evaluate_body() {
        let exchange = Exchange::with_id("ex-1").with_body("order-42");
        assert_eq!(KeyExpression::Body.evaluate(&exchange).unwrap(), "order-42");

        let empty = Exchange::with_id("ex-2");
        assert!(matches!(
            KeyExpression::Body.evaluate(&empty),
            Err(SelectionKeyError::EmptyBody { .. })
        ));

        let binary = Exchange::with_id("ex-3").with_body(vec![0xff, 0xfe]);
        assert!(matches!(
            KeyExpression::Body.evaluate(&binary),
            Err(SelectionKeyError::InvalidBody { .. })
        ));
    }

    #[test]
    fn test_evaluate_exchange_id() {
        let exchange = Exchange::with_id("ex-9");
        assert_eq!(KeyExpression::ExchangeId.evaluate(&exchange).unwrap(), "ex-9");
    }
}

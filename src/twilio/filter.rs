//! Filter visitor extracting message query parameters from a filter expression.

use chrono::{DateTime, Utc};

use super::client::MessageListQuery;
use crate::error::FilterError;
use crate::filter::{BinaryOperator, FilterExpr, FilterVisitor};
use crate::phrase::NounPhrase;
use crate::value::Value;

/// The fields messages can be filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterField {
    SenderNumber,
    RecipientNumber,
    DateSent,
}

impl FilterField {
    fn from_phrase(phrase: &NounPhrase) -> Option<Self> {
        match phrase.snake_case().as_str() {
            "sender_number" => Some(FilterField::SenderNumber),
            "recipient_number" => Some(FilterField::RecipientNumber),
            "date_sent" => Some(FilterField::DateSent),
            _ => None,
        }
    }
}

/// Accumulates query slots from one traversal of a filter expression.
///
/// Each recognized comparison populates one slot; slots left `None` are
/// omitted from the provider query. The traversal shares a "current field"
/// and "current value" pair which each comparison's subtrees fill in before
/// the operator is applied.
#[derive(Debug, Default)]
pub struct SmsMessageFilter {
    current_field: Option<FilterField>,
    current_value: Option<Value>,

    /// Exact recipient number.
    pub recipient_number: Option<String>,
    /// Exact sender number.
    pub sender_number: Option<String>,
    /// Exact sent-at instant.
    pub date_sent: Option<DateTime<Utc>>,
    /// Upper bound on the sent-at instant.
    pub date_sent_before: Option<DateTime<Utc>>,
    /// Lower bound on the sent-at instant.
    pub date_sent_after: Option<DateTime<Utc>>,
}

impl SmsMessageFilter {
    /// Walk `expression` and return the populated slot set.
    ///
    /// Any traversal error aborts the extraction; partial state is dropped
    /// with the visitor.
    pub fn extract(expression: &FilterExpr) -> Result<Self, FilterError> {
        let mut visitor = Self::default();
        expression.accept(&mut visitor)?;
        Ok(visitor)
    }

    /// Consume the slots into a provider query.
    pub fn into_query(self) -> MessageListQuery {
        MessageListQuery {
            to: self.recipient_number,
            from: self.sender_number,
            date_sent: self.date_sent,
            date_sent_before: self.date_sent_before,
            date_sent_after: self.date_sent_after,
        }
    }

    /// The current value as a timestamp, or the type-mismatch error naming
    /// the temporal field.
    fn timestamp(&self) -> Result<DateTime<Utc>, FilterError> {
        self.current_value
            .as_ref()
            .and_then(Value::as_timestamp)
            .ok_or(FilterError::TypeMismatch {
                field: "date_sent",
                expected: "timestamp",
            })
    }

    /// The current value stringified for an exact-match slot.
    fn text(&self) -> Option<String> {
        self.current_value.as_ref().map(Value::to_string)
    }
}

impl FilterVisitor for SmsMessageFilter {
    fn visit_binary(
        &mut self,
        operator: BinaryOperator,
        left: &FilterExpr,
        right: &FilterExpr,
    ) -> Result<(), FilterError> {
        left.accept(self)?;
        right.accept(self)?;

        match operator {
            BinaryOperator::Equals => match self.current_field {
                Some(FilterField::SenderNumber) => self.sender_number = self.text(),
                Some(FilterField::RecipientNumber) => self.recipient_number = self.text(),
                Some(FilterField::DateSent) => self.date_sent = Some(self.timestamp()?),
                None => {}
            },
            BinaryOperator::GreaterThan => {
                if self.current_field == Some(FilterField::DateSent) {
                    self.date_sent_after = Some(self.timestamp()?);
                }
            }
            BinaryOperator::LessThan => {
                if self.current_field == Some(FilterField::DateSent) {
                    self.date_sent_before = Some(self.timestamp()?);
                }
            }
            // Both sides already visited; conjunction is implicit.
            BinaryOperator::And => {}
            other => {
                return Err(FilterError::UnsupportedOperator {
                    operator: other.to_string(),
                });
            }
        }
        Ok(())
    }

    fn visit_fields(&mut self, phrases: &[NounPhrase]) -> Result<(), FilterError> {
        if phrases.len() != 1 {
            return Err(FilterError::UnsupportedField {
                field: phrases
                    .iter()
                    .map(NounPhrase::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
        match FilterField::from_phrase(&phrases[0]) {
            Some(field) => {
                self.current_field = Some(field);
                Ok(())
            }
            None => Err(FilterError::UnsupportedField {
                field: phrases[0].to_string(),
            }),
        }
    }

    fn visit_literal(&mut self, value: &Value) -> Result<(), FilterError> {
        self.current_value = Some(value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn equality_on_both_numbers() {
        let expr = FilterExpr::and(
            FilterExpr::equals("sender number", "+1800"),
            FilterExpr::equals("recipient number", "+1900"),
        );
        let filter = SmsMessageFilter::extract(&expr).unwrap();
        assert_eq!(filter.sender_number.as_deref(), Some("+1800"));
        assert_eq!(filter.recipient_number.as_deref(), Some("+1900"));
        assert_eq!(filter.date_sent, None);
        assert_eq!(filter.date_sent_before, None);
        assert_eq!(filter.date_sent_after, None);
    }

    #[test]
    fn date_range_sets_both_bounds() {
        let expr = FilterExpr::and(
            FilterExpr::greater_than("date sent", ts(1, 15)),
            FilterExpr::less_than("date sent", ts(3, 15)),
        );
        let filter = SmsMessageFilter::extract(&expr).unwrap();
        assert_eq!(filter.date_sent_after, Some(ts(1, 15)));
        assert_eq!(filter.date_sent_before, Some(ts(3, 15)));
        assert_eq!(filter.date_sent, None);
    }

    #[test]
    fn exact_date_requires_timestamp() {
        let expr = FilterExpr::equals("date sent", "2022-03-01");
        let err = SmsMessageFilter::extract(&expr).unwrap_err();
        match err {
            FilterError::TypeMismatch { field, expected } => {
                assert_eq!(field, "date_sent");
                assert_eq!(expected, "timestamp");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn date_bounds_require_timestamps() {
        for expr in [
            FilterExpr::greater_than("date sent", 5.0),
            FilterExpr::less_than("date sent", "yesterday"),
        ] {
            let err = SmsMessageFilter::extract(&expr).unwrap_err();
            assert!(matches!(err, FilterError::TypeMismatch { .. }));
        }
    }

    #[test]
    fn exact_date_with_timestamp_sets_the_slot() {
        let expr = FilterExpr::equals("date sent", ts(1, 15));
        let filter = SmsMessageFilter::extract(&expr).unwrap();
        assert_eq!(filter.date_sent, Some(ts(1, 15)));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let expr = FilterExpr::equals("subject line", "hi");
        let err = SmsMessageFilter::extract(&expr).unwrap_err();
        match err {
            FilterError::UnsupportedField { field } => assert_eq!(field, "subject line"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn multi_field_reference_is_rejected() {
        let expr = FilterExpr::Binary {
            operator: BinaryOperator::Equals,
            left: Box::new(FilterExpr::Fields(vec![
                NounPhrase::new("sender number"),
                NounPhrase::new("recipient number"),
            ])),
            right: Box::new(FilterExpr::literal("+1800")),
        };
        assert!(matches!(
            SmsMessageFilter::extract(&expr),
            Err(FilterError::UnsupportedField { .. })
        ));
    }

    #[test]
    fn unsupported_operator_is_rejected() {
        let expr = FilterExpr::compare(BinaryOperator::Or, "sender number", "+1800");
        let err = SmsMessageFilter::extract(&expr).unwrap_err();
        match err {
            FilterError::UnsupportedOperator { operator } => assert_eq!(operator, "or"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn field_names_fold_case_and_underscores() {
        let expr = FilterExpr::equals("Sender_Number", "+1800");
        let filter = SmsMessageFilter::extract(&expr).unwrap();
        assert_eq!(filter.sender_number.as_deref(), Some("+1800"));
    }

    #[test]
    fn unary_nodes_have_no_effect() {
        let expr = FilterExpr::Unary {
            operator: crate::filter::UnaryOperator::Not,
            operand: Box::new(FilterExpr::equals("sender number", "+1800")),
        };
        let filter = SmsMessageFilter::extract(&expr).unwrap();
        assert_eq!(filter.sender_number, None);
    }

    #[test]
    fn slots_consume_into_query() {
        let expr = FilterExpr::equals("recipient number", "+1900");
        let query = SmsMessageFilter::extract(&expr).unwrap().into_query();
        assert_eq!(query.to.as_deref(), Some("+1900"));
        assert_eq!(query.from, None);
    }
}

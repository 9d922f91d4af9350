use dialdesk_core::domain::{CallWindow, Disposition, PhoneMatchRule};
use rusqlite::types::Value;

/// Filters for listing stored call records.
#[derive(Debug, Default, Clone)]
pub struct CallQuery {
    pub number: Option<String>,
    pub window: CallWindow,
    pub disposition: Option<Disposition>,
    pub limit: Option<usize>,
}

pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl CallQuery {
    /// Builds the WHERE/ORDER/LIMIT tail for a `SELECT ... FROM call_records`.
    /// `number` is reduced with `rule`; a number that reduces to nothing
    /// matches no rows.
    pub fn to_sql(&self, select: &str, rule: &PhoneMatchRule) -> SqlQuery {
        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(number) = self.number.as_deref() {
            match rule.key(number) {
                Some(key) => {
                    clauses.push("(src_norm = ? OR dst_norm = ?)");
                    params.push(Value::from(key.clone()));
                    params.push(Value::from(key));
                }
                None => clauses.push("0"),
            }
        }

        push_window(&self.window, &mut clauses, &mut params);

        if let Some(disposition) = self.disposition.as_ref() {
            clauses.push("disposition = ?");
            params.push(Value::from(disposition.as_str().to_string()));
        }

        let mut sql = select.to_string();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY calldate DESC, uniqueid ASC");
        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            params.push(Value::from(i64::try_from(limit).unwrap_or(i64::MAX)));
        }
        sql.push(';');

        SqlQuery { sql, params }
    }
}

pub(crate) fn push_window(window: &CallWindow, clauses: &mut Vec<&str>, params: &mut Vec<Value>) {
    if let Some(from) = window.from {
        clauses.push("calldate >= ?");
        params.push(Value::from(from));
    }
    if let Some(to) = window.to {
        clauses.push("calldate <= ?");
        params.push(Value::from(to));
    }
}

#[cfg(test)]
mod tests {
    use super::CallQuery;
    use dialdesk_core::domain::{CallWindow, Disposition, PhoneMatchRule};

    #[test]
    fn empty_query_has_no_where_clause() {
        let query = CallQuery::default().to_sql("SELECT id FROM call_records", &PhoneMatchRule::default());
        assert_eq!(
            query.sql,
            "SELECT id FROM call_records ORDER BY calldate DESC, uniqueid ASC;"
        );
        assert!(query.params.is_empty());
    }

    #[test]
    fn filters_combine_with_and() {
        let query = CallQuery {
            number: Some("+1 (555) 123".to_string()),
            window: CallWindow::new(Some(10), Some(20)).unwrap(),
            disposition: Some(Disposition::Busy),
            limit: Some(5),
        }
        .to_sql("SELECT id FROM call_records", &PhoneMatchRule::default());
        assert!(query.sql.contains("(src_norm = ? OR dst_norm = ?) AND calldate >= ? AND calldate <= ? AND disposition = ?"));
        assert!(query.sql.ends_with("LIMIT ?;"));
        assert_eq!(query.params.len(), 6);
    }

    #[test]
    fn unmatchable_number_selects_nothing() {
        let query = CallQuery {
            number: Some("anonymous".to_string()),
            ..Default::default()
        }
        .to_sql("SELECT id FROM call_records", &PhoneMatchRule::default());
        assert!(query.sql.contains(" WHERE 0 "));
    }
}

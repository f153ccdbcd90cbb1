use sqlx::{Executor, MySql};

/// Value bound to one `SET` column.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    U64(u64),
}

/// Sparse `UPDATE` whose column names come from code, never from the request.
#[derive(Debug)]
pub struct SqlUpdate {
    table: &'static str,
    sets: Vec<(&'static str, SqlValue)>,
}

impl SqlUpdate {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            sets: Vec::new(),
        }
    }

    pub fn set(&mut self, column: &'static str, value: SqlValue) -> &mut Self {
        self.sets.push((column, value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn columns(&self) -> Vec<&'static str> {
        self.sets.iter().map(|(c, _)| *c).collect()
    }

    pub fn sql(&self, id_column: &str) -> String {
        let set_clause = self
            .sets
            .iter()
            .map(|(c, _)| format!("{c} = ?"))
            .collect::<Vec<_>>()
            .join(", ");

        format!("UPDATE {} SET {} WHERE {} = ?", self.table, set_clause, id_column)
    }

    /// Runs the update and returns the number of affected rows.
    pub async fn execute<'e, E>(&self, executor: E, id_column: &str, id: u64) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = MySql>,
    {
        let sql = self.sql(id_column);
        let mut query = sqlx::query(&sql);

        for (_, value) in &self.sets {
            query = match value {
                SqlValue::Text(v) => query.bind(v.clone()),
                SqlValue::U64(v) => query.bind(*v),
            };
        }

        let result = query.bind(id).execute(executor).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_placeholders_in_insertion_order() {
        let mut update = SqlUpdate::new("users");
        update
            .set("name", SqlValue::Text("Andi".into()))
            .set("department_id", SqlValue::U64(3));

        assert_eq!(
            update.sql("id"),
            "UPDATE users SET name = ?, department_id = ? WHERE id = ?"
        );
        assert_eq!(update.columns(), vec!["name", "department_id"]);
    }

    #[test]
    fn starts_empty() {
        assert!(SqlUpdate::new("users").is_empty());
    }
}

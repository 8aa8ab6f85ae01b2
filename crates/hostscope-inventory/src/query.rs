//! osquery SQL builder

use std::fmt;

/// SQL statement for a single osquery table
///
/// Literal values are single-quote escaped, so they can come from
/// configuration without opening an injection hole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: String,
    columns: Vec<String>,
    filters: Vec<String>,
    order_by: Option<String>,
}

impl Query {
    /// `SELECT * FROM table`
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            order_by: None,
        }
    }

    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Add `column IN ('a', 'b')`
    #[must_use]
    pub fn filter_in(mut self, column: &str, values: &[&str]) -> Self {
        let quoted: Vec<String> = values.iter().map(|v| quote(v)).collect();
        self.filters.push(format!("{column} IN ({})", quoted.join(", ")));
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: &str) -> Self {
        self.order_by = Some(column.to_string());
        self
    }

    #[must_use]
    pub fn to_sql(&self) -> String {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };
        let mut sql = format!("SELECT {columns} FROM {}", self.table);

        if !self.filters.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.filters.join(" AND "));
        }
        if let Some(ref column) = self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(column);
        }

        sql
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Extract the table name following `FROM` (simple heuristic)
#[must_use]
pub fn table_of(sql: &str) -> Option<String> {
    let lower = sql.to_ascii_lowercase();
    let pos = lower.find(" from ")? + " from ".len();
    let rest = sql[pos..].trim_start();
    let end = rest
        .find(|c: char| c.is_whitespace() || c == ';')
        .unwrap_or(rest.len());
    Some(rest[..end].to_string())
}

/// Queries used by the analyzer modules
pub mod queries {
    use super::Query;

    #[must_use]
    pub fn deb_packages() -> Query {
        Query::table("deb_packages")
            .columns(&["name", "version", "arch"])
            .order_by("name")
    }

    #[must_use]
    pub fn rpm_packages() -> Query {
        Query::table("rpm_packages")
            .columns(&["name", "version", "arch"])
            .order_by("name")
    }

    #[must_use]
    pub fn interface_addresses() -> Query {
        Query::table("interface_addresses").columns(&["interface", "address", "mask"])
    }

    /// Inet sockets only (`AF_INET`, `AF_INET6`); unix sockets carry no port
    #[must_use]
    pub fn listening_ports() -> Query {
        Query::table("listening_ports")
            .columns(&["pid", "port", "protocol", "address"])
            .filter_in("family", &["2", "10"])
            .order_by("port")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_statement() {
        let sql = Query::table("deb_packages")
            .columns(&["name", "version"])
            .filter_in("arch", &["amd64"])
            .filter_in("name", &["curl", "vim"])
            .order_by("name")
            .to_sql();

        assert_eq!(
            sql,
            "SELECT name, version FROM deb_packages WHERE arch IN ('amd64') \
             AND name IN ('curl', 'vim') ORDER BY name"
        );
    }

    #[test]
    fn test_select_star_by_default() {
        assert_eq!(Query::table("uptime").to_sql(), "SELECT * FROM uptime");
    }

    #[test]
    fn test_quotes_are_escaped() {
        let sql = Query::table("users")
            .filter_in("username", &["x' OR '1'='1"])
            .to_sql();
        assert!(sql.ends_with("username IN ('x'' OR ''1''=''1')"));
    }

    #[test]
    fn test_listening_ports_skips_unix_sockets() {
        let sql = queries::listening_ports().to_sql();
        assert_eq!(
            sql,
            "SELECT pid, port, protocol, address FROM listening_ports \
             WHERE family IN ('2', '10') ORDER BY port"
        );
        assert_eq!(table_of(&sql), Some("listening_ports".to_string()));
    }

    #[test]
    fn test_table_of() {
        assert_eq!(
            table_of("SELECT * FROM deb_packages"),
            Some("deb_packages".to_string())
        );
        assert_eq!(
            table_of("select name from rpm_packages where arch = 'x86_64';"),
            Some("rpm_packages".to_string())
        );
        assert_eq!(table_of("PRAGMA table_info"), None);
    }
}

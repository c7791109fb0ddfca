//! Database server access through the `mysql` client

use converge::{CommandExecutor, ExecError, Invocation};

use crate::site::DbSettings;

/// Administrative account of the development database server
pub const ROOT_USER: &str = "root";
pub const ROOT_PASSWORD: &str = "root";

/// Administrative connection to the database server
pub struct Database<'a> {
    exec: &'a dyn CommandExecutor,
    root_user: String,
    root_password: String,
}

impl<'a> Database<'a> {
    pub fn new(exec: &'a dyn CommandExecutor, root_user: &str, root_password: &str) -> Self {
        Self {
            exec,
            root_user: root_user.to_string(),
            root_password: root_password.to_string(),
        }
    }

    fn sql(&self, statement: &str) -> Invocation {
        Invocation::new([
            "mysql".to_string(),
            "-u".to_string(),
            self.root_user.clone(),
            format!("--password={}", self.root_password),
            "-e".to_string(),
            statement.to_string(),
        ])
    }

    /// Create the database unless it already exists
    pub fn create_database(&self, name: &str) -> Result<(), ExecError> {
        let stmt = format!("CREATE DATABASE IF NOT EXISTS {}", quote_ident(name));
        self.exec.run_checked(&self.sql(&stmt)).map(drop)
    }

    /// Ensure the application user exists and owns the database
    pub fn grant(&self, db: &DbSettings) -> Result<(), ExecError> {
        let user = format!("{}@{}", quote_literal(&db.user), quote_literal(&db.host));
        let stmt = format!(
            "CREATE USER IF NOT EXISTS {user} IDENTIFIED BY {pass}; \
             GRANT ALL PRIVILEGES ON {name}.* TO {user}; \
             FLUSH PRIVILEGES;",
            pass = quote_literal(&db.password),
            name = quote_ident(&db.name),
        );
        self.exec.run_checked(&self.sql(&stmt)).map(drop)
    }
}

/// Backtick-quote an identifier
fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Single-quote a string literal
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

//! Convenience constructors for common SQL functions

use crate::Expr;

pub fn count(expr: Expr) -> Expr {
    Expr::func("COUNT", [expr])
}

pub fn sum(expr: Expr) -> Expr {
    Expr::func("SUM", [expr])
}

pub fn avg(expr: Expr) -> Expr {
    Expr::func("AVG", [expr])
}

pub fn min(expr: Expr) -> Expr {
    Expr::func("MIN", [expr])
}

pub fn max(expr: Expr) -> Expr {
    Expr::func("MAX", [expr])
}

pub fn coalesce<I>(values: I) -> Expr
where
    I: IntoIterator<Item = Expr>,
{
    Expr::func("COALESCE", values)
}

pub fn now() -> Expr {
    Expr::func("NOW", [])
}

/// The ISNULL function, not to be confused with the `IS NULL` test
/// ([`Expr::is_null`]).
pub fn isnull(expr: Expr) -> Expr {
    Expr::func("ISNULL", [expr])
}

pub fn date(expr: Expr) -> Expr {
    Expr::func("DATE", [expr])
}

/// The two-branch IF function.
pub fn if_else(consequence: Expr, alternative: Expr) -> Expr {
    Expr::func("IF", [consequence, alternative])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToSql;

    #[test]
    fn test_aggregates() {
        let (sql, _) = count(Expr::ident("id")).to_sql().unwrap();
        assert_eq!(sql, "COUNT(id)");

        let (sql, _) = avg(Expr::ident("conn")).to_sql().unwrap();
        assert_eq!(sql, "AVG(conn)");

        let (sql, _) = max(Expr::qualified("age", ["u"])).to_sql().unwrap();
        assert_eq!(sql, "MAX(u.age)");
    }

    #[test]
    fn test_nullary_function() {
        let (sql, args) = now().to_sql().unwrap();
        assert_eq!(sql, "NOW()");
        assert!(args.is_empty());
    }

    #[test]
    fn test_coalesce() {
        let (sql, _) = coalesce([Expr::ident("nick"), Expr::ident("name"), Expr::literal("anon")])
            .to_sql()
            .unwrap();
        assert_eq!(sql, "COALESCE(nick, name, 'anon')");
    }

    #[test]
    fn test_count_star() {
        let (sql, _) = count(Expr::ident("*")).to_sql().unwrap();
        assert_eq!(sql, "COUNT(*)");
    }
}

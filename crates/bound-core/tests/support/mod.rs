// Test support: a tiny in-memory student table with a parameterized query
// surface. Query execution stays out of the core crate; this is just enough
// SQL to demonstrate the difference between spliced text and bound
// parameters.

use bound_core::Value;

pub struct Student {
    pub id: i64,
    pub name: &'static str,
    pub grade: i64,
}

pub struct StudentDb {
    rows: Vec<Student>,
}

struct Cond {
    column: String,
    value: Value,
}

impl StudentDb {
    pub fn seeded() -> Self {
        let names = [
            ("Alice", 100),
            ("Bob", 90),
            ("Ivan", 80),
            ("Charlie", 70),
            ("David", 60),
            ("Eve", 50),
            ("Frank", 40),
            ("Grace", 30),
            ("Heidi", 20),
            ("Robert", 10),
        ];
        StudentDb {
            rows: names
                .iter()
                .enumerate()
                .map(|(i, (name, grade))| Student {
                    id: i as i64 + 1,
                    name,
                    grade: *grade,
                })
                .collect(),
        }
    }

    /// Run `SELECT grade FROM student WHERE ...` and return matching
    /// grades. Placeholders `?` (positional) and `$n` (numbered) resolve
    /// against `params`; everything else in the WHERE clause is taken as
    /// inline text, comments stripped, OR conditions honored — the way a
    /// real engine would treat spliced-in input.
    pub fn execute(&self, sql: &str, params: &[Value]) -> Vec<i64> {
        let sql = strip_comments(sql);
        let conds = match sql.split_once("WHERE") {
            Some((_, clause)) => parse_conditions(clause, params),
            None => Vec::new(),
        };
        self.rows
            .iter()
            .filter(|row| conds.is_empty() || conds.iter().any(|c| cond_matches(c, row)))
            .map(|row| row.grade)
            .collect()
    }
}

fn strip_comments(sql: &str) -> String {
    sql.lines()
        .map(|line| match line.find("--") {
            Some(i) => &line[..i],
            None => line,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_conditions(clause: &str, params: &[Value]) -> Vec<Cond> {
    let mut positional = 0usize;
    clause
        .split(" OR ")
        .filter_map(|cond| {
            let cond = cond.trim().trim_end_matches(';').trim();
            let (column, rhs) = cond.split_once('=')?;
            let rhs = rhs.trim();
            let value = if rhs == "?" {
                let v = params.get(positional).cloned()?;
                positional += 1;
                v
            } else if let Some(n) = rhs.strip_prefix('$') {
                params.get(n.parse::<usize>().ok()?.checked_sub(1)?).cloned()?
            } else if rhs.starts_with('\'') && rhs.ends_with('\'') && rhs.len() >= 2 {
                Value::Str(rhs[1..rhs.len() - 1].to_string())
            } else {
                Value::Integer(rhs.parse().ok()?)
            };
            Some(Cond {
                column: column.trim().to_string(),
                value,
            })
        })
        .collect()
}

fn cond_matches(cond: &Cond, row: &Student) -> bool {
    match (cond.column.as_str(), &cond.value) {
        ("name", Value::Str(s)) => row.name == s.as_str(),
        ("id", Value::Integer(n)) => row.id == *n,
        ("grade", Value::Integer(n)) => row.grade == *n,
        _ => false,
    }
}

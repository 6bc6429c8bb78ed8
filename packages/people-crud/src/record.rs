//! Person records and row filters.

use chrono::NaiveDate;

/// Maximum length of `Name` in characters (`VARCHAR(50)`).
pub const MAX_NAME_LEN: usize = 50;

/// A stored row of the `People` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Person {
    #[sqlx(rename = "Index")]
    pub index: i32,
    #[sqlx(rename = "Name")]
    pub name: String,
    #[sqlx(rename = "DateOfBirth")]
    pub date_of_birth: Option<NaiveDate>,
}

impl Person {
    pub fn new(index: i32, name: impl Into<String>, date_of_birth: Option<NaiveDate>) -> Self {
        Self {
            index,
            name: name.into(),
            date_of_birth,
        }
    }

    /// Date of birth in canonical `YYYY-MM-DD` form.
    pub fn date_string(&self) -> Option<String> {
        self.date_of_birth.map(|d| d.to_string())
    }
}

/// An insert request. `index: None` lets the table sequence assign it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub index: Option<i32>,
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
}

impl NewPerson {
    /// A record with only a name; index and date are left to the database.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            index: None,
            name: name.into(),
            date_of_birth: None,
        }
    }

    pub fn with_index(mut self, index: i32) -> Self {
        self.index = Some(index);
        self
    }

    pub fn born(mut self, date: NaiveDate) -> Self {
        self.date_of_birth = Some(date);
        self
    }
}

/// How a filter matches `Name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
    /// `"Name" = value`
    Exact(String),
    /// `"Name" LIKE pattern`, with `%`, `_` and backslash escapes
    Like(String),
}

/// Conjunction of optional column predicates. Empty selects every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonFilter {
    pub index: Option<i32>,
    pub name: Option<NameMatch>,
    pub date_of_birth: Option<NaiveDate>,
}

impl PersonFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_index(index: i32) -> Self {
        Self::default().index(index)
    }

    /// Matches the exact stored triple of `person`. A missing date is not constrained.
    pub fn exact(person: &NewPerson) -> Self {
        let mut filter = Self::default().name(&person.name);
        filter.index = person.index;
        filter.date_of_birth = person.date_of_birth;
        filter
    }

    pub fn index(mut self, index: i32) -> Self {
        self.index = Some(index);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(NameMatch::Exact(name.into()));
        self
    }

    pub fn name_like(mut self, pattern: impl Into<String>) -> Self {
        self.name = Some(NameMatch::Like(pattern.into()));
        self
    }

    pub fn born(mut self, date: NaiveDate) -> Self {
        self.date_of_birth = Some(date);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_none() && self.name.is_none() && self.date_of_birth.is_none()
    }

    /// Evaluates the filter against an in-memory row.
    pub fn matches(&self, person: &Person) -> bool {
        if self.index.is_some_and(|i| i != person.index) {
            return false;
        }
        if let Some(date) = self.date_of_birth {
            if person.date_of_birth != Some(date) {
                return false;
            }
        }
        match &self.name {
            Some(NameMatch::Exact(name)) => *name == person.name,
            Some(NameMatch::Like(pattern)) => like(pattern, &person.name),
            None => true,
        }
    }
}

/// One element of a compiled `LIKE` pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    AnyRun,
    AnyOne,
    Literal(char),
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => Token::AnyRun,
            '_' => Token::AnyOne,
            // A trailing backslash matches itself.
            '\\' => Token::Literal(chars.next().unwrap_or('\\')),
            c => Token::Literal(c),
        });
    }
    tokens
}

/// SQL `LIKE` matching: `%` is any run of characters, `_` exactly one,
/// a backslash makes the next character literal. Case-sensitive.
///
/// Greedy scan that backtracks only to the most recent `%`, so the cost is
/// bounded by `pattern.len() * text.len()`.
pub fn like(pattern: &str, text: &str) -> bool {
    let pattern = tokenize(pattern);
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // Position after the last `%` seen, and the text position it resumes from.
    let mut resume: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(Token::AnyRun) => {
                p += 1;
                resume = Some((p, t));
            }
            Some(Token::AnyOne) => {
                p += 1;
                t += 1;
            }
            Some(Token::Literal(c)) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match resume {
                Some((after_run, from)) => {
                    p = after_run;
                    t = from + 1;
                    resume = Some((after_run, from + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|token| *token == Token::AnyRun)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_like_wildcards() {
        assert!(like("%Mar%", "Anna Maria"));
        assert!(like("Anna%", "Anna Maria"));
        assert!(like("B_b", "Bob"));
        assert!(like("%", ""));
        assert!(!like("%mar%", "Anna Maria"));
        assert!(!like("B_b", "Bb"));
        assert!(!like("Anna", "Anna Maria"));
    }

    #[test]
    fn test_like_escape() {
        assert!(like("100\\%", "100%"));
        assert!(!like("100\\%", "1000"));
        assert!(like("a\\_b", "a_b"));
        assert!(!like("a\\_b", "axb"));
    }

    #[test]
    fn test_like_many_wildcards_stay_linear() {
        let text = "a".repeat(200);
        let pattern = format!("{}b", "%a".repeat(30));
        assert!(!like(&pattern, &text));
        assert!(like(&"%a".repeat(30), &text));
        assert!(like("%a%b%", "xxaxxbxx"));
        assert!(!like("%a%b", "xxaxxbxx"));
    }

    #[test]
    fn test_like_trailing_backslash() {
        assert!(like("a\\", "a\\"));
        assert!(!like("a\\", "a"));
    }

    #[test]
    fn test_like_unicode() {
        assert!(like("Д'%", "Д'Артаньян"));
        assert!(like("_'Артаньян", "Д'Артаньян"));
    }

    #[test]
    fn test_filter_matches() {
        let anna = Person::new(4, "Anna Maria", Some(date("2023-12-12")));
        assert!(PersonFilter::all().matches(&anna));
        assert!(PersonFilter::by_index(4).name_like("%Mar%").matches(&anna));
        assert!(!PersonFilter::by_index(5).matches(&anna));
        assert!(!PersonFilter::all().name("Anna").matches(&anna));
        assert!(!PersonFilter::all().born(date("2023-12-13")).matches(&anna));

        let blank = Person::new(2, " ", None);
        assert!(PersonFilter::all().name(" ").matches(&blank));
        assert!(!PersonFilter::all().born(date("2023-12-12")).matches(&blank));
    }

    #[test]
    fn test_exact_filter_from_new_person() {
        let new = NewPerson::named("Bob").with_index(6).born(date("1901-01-10"));
        let filter = PersonFilter::exact(&new);
        assert_eq!(filter.index, Some(6));
        assert_eq!(filter.name, Some(NameMatch::Exact("Bob".to_string())));
        assert_eq!(filter.date_of_birth, Some(date("1901-01-10")));
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_date_string_is_canonical() {
        let person = Person::new(1, "Den", Some(date("2022-11-11")));
        assert_eq!(person.date_string().as_deref(), Some("2022-11-11"));
        assert_eq!(Person::new(2, " ", None).date_string(), None);
    }
}

use crate::domain::model::{Athlete, Submission, SubmissionReceipt};
use crate::domain::ports::ScoreBackend;
use crate::utils::error::{BoardError, Result};
use std::future::Future;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Athletes on the platform, in the order the backend listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AthleteRoster {
    athletes: Vec<Athlete>,
    current_index: usize,
}

impl AthleteRoster {
    pub fn new(athletes: Vec<Athlete>) -> Self {
        Self {
            athletes,
            current_index: 0,
        }
    }

    pub fn athletes(&self) -> &[Athlete] {
        &self.athletes
    }

    pub fn len(&self) -> usize {
        self.athletes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.athletes.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> Option<&Athlete> {
        self.athletes.get(self.current_index)
    }

    /// Move to the next athlete, wrapping to the first. No-op when empty.
    pub fn advance(&mut self) -> Option<&Athlete> {
        if self.athletes.is_empty() {
            return None;
        }
        self.current_index = (self.current_index + 1) % self.athletes.len();
        self.current()
    }
}

/// Parse a `dashboard_get` body.
///
/// The backend writes the mapping with Python's `dict` repr
/// (`{'7': 'Ann A A'}`); plain JSON objects are accepted as well. Entry order
/// is preserved.
pub fn parse_roster_body(body: &str) -> Result<AthleteRoster> {
    let trimmed = body.trim();
    if let Ok(map) = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(trimmed) {
        let athletes = map
            .into_iter()
            .map(|(id, value)| match value {
                serde_json::Value::String(name) => Athlete::new(id, name),
                other => Athlete::new(id, other.to_string()),
            })
            .collect();
        return Ok(AthleteRoster::new(athletes));
    }

    DictLiteral::new(trimmed)
        .parse()
        .map(AthleteRoster::new)
        .map_err(|reason| BoardError::roster(format!("malformed roster body: {}", reason)))
}

struct DictLiteral<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> DictLiteral<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
        }
    }

    fn parse(mut self) -> std::result::Result<Vec<Athlete>, String> {
        self.expect('{')?;
        let mut athletes = Vec::new();
        loop {
            self.skip_whitespace();
            if self.eat('}') {
                break;
            }
            let id = self.key()?;
            self.expect(':')?;
            let name = self.string()?;
            athletes.push(Athlete::new(id, name));

            self.skip_whitespace();
            if self.eat(',') {
                continue;
            }
            self.expect('}')?;
            break;
        }
        self.skip_whitespace();
        match self.chars.next() {
            None => Ok(athletes),
            Some(c) => Err(format!("unexpected '{}' after closing brace", c)),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn eat(&mut self, expected: char) -> bool {
        self.chars.next_if_eq(&expected).is_some()
    }

    fn expect(&mut self, expected: char) -> std::result::Result<(), String> {
        self.skip_whitespace();
        match self.chars.next() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(format!("expected '{}', found '{}'", expected, c)),
            None => Err(format!("expected '{}', found end of input", expected)),
        }
    }

    fn key(&mut self) -> std::result::Result<String, String> {
        self.skip_whitespace();
        match self.chars.peek().copied() {
            Some('\'') | Some('"') => self.string(),
            Some(c) if c.is_ascii_digit() || c == '-' => {
                let mut digits = String::new();
                while let Some(c) = self.chars.next_if(|c| c.is_ascii_digit() || *c == '-') {
                    digits.push(c);
                }
                Ok(digits)
            }
            Some(c) => Err(format!("unexpected '{}' where a key was expected", c)),
            None => Err("unexpected end of input".to_string()),
        }
    }

    fn string(&mut self) -> std::result::Result<String, String> {
        self.skip_whitespace();
        let quote = match self.chars.next() {
            Some(q @ ('\'' | '"')) => q,
            Some(c) => return Err(format!("expected a quoted string, found '{}'", c)),
            None => return Err("expected a quoted string, found end of input".to_string()),
        };

        let mut text = String::new();
        loop {
            match self.chars.next() {
                Some(c) if c == quote => return Ok(text),
                Some('\\') => self.escape(&mut text)?,
                Some(c) => text.push(c),
                None => return Err("unterminated string".to_string()),
            }
        }
    }

    fn escape(&mut self, text: &mut String) -> std::result::Result<(), String> {
        match self.chars.next() {
            Some('n') => text.push('\n'),
            Some('t') => text.push('\t'),
            Some('r') => text.push('\r'),
            Some('x') => text.push(self.code_point(2)?),
            Some('u') => text.push(self.code_point(4)?),
            Some('U') => text.push(self.code_point(8)?),
            Some(c @ ('\\' | '\'' | '"')) => text.push(c),
            // Python keeps unknown escapes verbatim.
            Some(c) => {
                text.push('\\');
                text.push(c);
            }
            None => return Err("unterminated escape".to_string()),
        }
        Ok(())
    }

    fn code_point(&mut self, width: usize) -> std::result::Result<char, String> {
        let digits: String = (0..width).filter_map(|_| self.chars.next()).collect();
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| format!("invalid escape digits '{}'", digits))
    }
}

/// Keeps the roster and talks to the backend on its behalf.
pub struct RosterSync<B: ScoreBackend> {
    backend: Arc<B>,
    platform: u32,
    competition: u32,
    roster: AthleteRoster,
}

impl<B: ScoreBackend> RosterSync<B> {
    pub fn new(backend: Arc<B>, platform: u32, competition: u32) -> Self {
        Self {
            backend,
            platform,
            competition,
            roster: AthleteRoster::default(),
        }
    }

    pub fn roster(&self) -> &AthleteRoster {
        &self.roster
    }

    pub fn current(&self) -> Option<&Athlete> {
        self.roster.current()
    }

    /// Fetch the roster. The returned future owns everything it needs so it
    /// can run on its own task while the board keeps scoring.
    pub fn load_roster(&self) -> impl Future<Output = Result<AthleteRoster>> + Send + 'static {
        let backend = Arc::clone(&self.backend);
        let platform = self.platform;
        let competition = self.competition;

        async move {
            tracing::debug!(
                "Fetching roster for platform {} competition {}",
                platform,
                competition
            );
            let roster = backend.fetch_roster(platform, competition).await?;
            if roster.is_empty() {
                return Err(BoardError::roster("backend returned no athletes"));
            }
            tracing::info!("📋 Received roster with {} athletes", roster.len());
            for athlete in roster.athletes() {
                tracing::debug!("Roster entry {} : {}", athlete.id, athlete.name);
            }
            Ok(roster)
        }
    }

    pub fn install(&mut self, roster: AthleteRoster) -> Option<&Athlete> {
        self.roster = roster;
        self.roster.current()
    }

    pub fn advance(&mut self) -> Option<&Athlete> {
        self.roster.advance()
    }

    /// Send `count` for the current athlete on a background task.
    ///
    /// Zero results never reach the backend; nothing is sent without a
    /// current athlete either. The outcome is only logged.
    pub fn submit(&self, count: u32) -> Option<JoinHandle<Result<SubmissionReceipt>>> {
        if count == 0 {
            tracing::info!("Counter can't be zero, result not sent");
            return None;
        }
        let Some(athlete) = self.roster.current() else {
            tracing::warn!("⚠️ No current athlete, result {} not sent", count);
            return None;
        };

        let submission = Submission {
            athlete_id: athlete.id.clone(),
            competition: self.competition,
            result: count,
        };
        let backend = Arc::clone(&self.backend);

        Some(tokio::spawn(async move {
            tracing::info!(
                "📤 Sending result {} for athlete {}",
                submission.result,
                submission.athlete_id
            );
            match backend.submit_result(&submission).await {
                Ok(response) => {
                    tracing::info!("✅ Backend answered: {}", response.trim());
                    Ok(SubmissionReceipt {
                        submission,
                        response,
                        submitted_at: chrono::Utc::now(),
                    })
                }
                Err(e) => {
                    tracing::warn!("❌ Result submission failed: {}", e);
                    Err(e)
                }
            }
        }))
    }
}

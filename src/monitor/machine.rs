//! Availability state machines.
//!
//! Each monitor is advanced by an external tick with whatever the probe saw
//! and answers with the [`Action`] the runner should perform. No timers or
//! I/O live here.

use crate::arr::FileStatus;
use placeholdarr_common::SeasonKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Pending,
    /// Some but not all episodes of a season have arrived. Movie monitors stay
    /// `Pending` while queued.
    Downloading,
    Resolved,
    TimedOut,
}

impl MonitorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::TimedOut)
    }
}

/// What the runner should do after a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing to report
    Wait,
    /// Write this status line into the item description
    ContinueWithStatus(String),
    /// The real file is in; terminate sessions playing this path
    ResolveAndTerminate(String),
    /// Out of attempts; write the message if there is one
    GiveUp(Option<String>),
}

/// A state machine driven by [`drive`](super::runner::drive).
pub trait Monitor: Send {
    type Observation: Send;

    /// Advance by one tick. `None` means the probe failed this time.
    fn on_tick(&mut self, observation: Option<Self::Observation>) -> Action;

    fn state(&self) -> MonitorState;

    fn attempts(&self) -> u32;

    /// Short label for logs
    fn describe(&self) -> String;
}

/// One poll of a movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovieObservation {
    pub file: FileStatus,
    pub downloading: bool,
}

pub const DOWNLOADING_STATUS: &str = "Movie is currently downloading. Waiting for completion...";

#[derive(Debug, Clone)]
pub struct MovieMonitor {
    movie_id: i64,
    file_path: String,
    attempts: u32,
    max_attempts: u32,
    state: MonitorState,
}

impl MovieMonitor {
    /// `file_path` is the path the player opened, used to find its session.
    pub fn new(movie_id: i64, file_path: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            movie_id,
            file_path: file_path.into(),
            attempts: 0,
            max_attempts,
            state: MonitorState::Pending,
        }
    }

    pub fn movie_id(&self) -> i64 {
        self.movie_id
    }
}

impl Monitor for MovieMonitor {
    type Observation = MovieObservation;

    fn on_tick(&mut self, observation: Option<MovieObservation>) -> Action {
        if self.state.is_terminal() {
            return Action::Wait;
        }

        self.attempts += 1;

        let action = match observation {
            Some(MovieObservation {
                file: FileStatus::Real,
                ..
            }) => {
                self.state = MonitorState::Resolved;
                return Action::ResolveAndTerminate(self.file_path.clone());
            }
            // A queued download only changes the status text
            Some(MovieObservation {
                downloading: true, ..
            }) => {
                self.state = MonitorState::Pending;
                Action::ContinueWithStatus(DOWNLOADING_STATUS.to_string())
            }
            // The search was issued before the first tick; nothing new to say
            Some(MovieObservation {
                file: FileStatus::Placeholder,
                ..
            }) => {
                self.state = MonitorState::Pending;
                Action::Wait
            }
            Some(MovieObservation {
                file: FileStatus::Absent,
                ..
            }) => {
                self.state = MonitorState::Pending;
                Action::ContinueWithStatus(format!(
                    "Checking availability for movie (attempt {}/{})...",
                    self.attempts, self.max_attempts
                ))
            }
            None => Action::Wait,
        };

        if self.attempts >= self.max_attempts {
            self.state = MonitorState::TimedOut;
            return Action::GiveUp(None);
        }

        action
    }

    fn state(&self) -> MonitorState {
        self.state
    }

    fn attempts(&self) -> u32 {
        self.attempts
    }

    fn describe(&self) -> String {
        format!("movie {}", self.movie_id)
    }
}

/// Season monitor: resolved once every episode has a real file.
#[derive(Debug, Clone)]
pub struct SeasonMonitor {
    season: SeasonKey,
    file_path: String,
    attempts: u32,
    max_attempts: u32,
    remaining: Option<usize>,
    state: MonitorState,
}

impl SeasonMonitor {
    pub fn new(season: SeasonKey, file_path: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            season,
            file_path: file_path.into(),
            attempts: 0,
            max_attempts,
            remaining: None,
            state: MonitorState::Pending,
        }
    }

    pub fn season(&self) -> SeasonKey {
        self.season
    }

    /// Episodes without a real file as of the last successful poll
    pub fn remaining(&self) -> Option<usize> {
        self.remaining
    }
}

impl Monitor for SeasonMonitor {
    /// File status of every episode in the season
    type Observation = Vec<FileStatus>;

    fn on_tick(&mut self, observation: Option<Vec<FileStatus>>) -> Action {
        if self.state.is_terminal() {
            return Action::Wait;
        }

        self.attempts += 1;

        let action = match observation {
            // An empty listing means the catalog has not populated the season yet
            Some(episodes) if episodes.is_empty() => Action::Wait,
            Some(episodes) => {
                let total = episodes.len();
                let remaining = episodes.iter().filter(|f| !f.is_real()).count();
                self.remaining = Some(remaining);

                if remaining == 0 {
                    self.state = MonitorState::Resolved;
                    return Action::ResolveAndTerminate(self.file_path.clone());
                }

                self.state = if remaining < total {
                    MonitorState::Downloading
                } else {
                    MonitorState::Pending
                };

                Action::ContinueWithStatus(format!(
                    "Season {}: {} episodes remaining (attempt {}/{})...",
                    self.season.season_number, remaining, self.attempts, self.max_attempts
                ))
            }
            None => Action::Wait,
        };

        if self.attempts >= self.max_attempts {
            self.state = MonitorState::TimedOut;
            let still_missing = match self.remaining {
                Some(n) => format!("{} episodes still missing", n),
                None => "episode list unavailable".to_string(),
            };
            return Action::GiveUp(Some(format!(
                "Timed out waiting for season {} ({}). Please try again later.",
                self.season.season_number, still_missing
            )));
        }

        action
    }

    fn state(&self) -> MonitorState {
        self.state
    }

    fn attempts(&self) -> u32 {
        self.attempts
    }

    fn describe(&self) -> String {
        self.season.to_string()
    }
}

//! A small textual query surface over one thread's call tree.
//!
//! Commands:
//! - `"<start>,<end>"` pushes a view range (milliseconds) onto the range
//!   stack, clamped to the current view,
//! - `"pop"` drops the innermost range,
//! - `"top-total [N]"` / `"top-self [N]"` return the heaviest functions of
//!   the current view by total or self time.
//!
//! This is a consumer of the derivation engine, not part of it; it exists
//! for driving the engine from tests and command line tooling.

use serde_derive::Serialize;

use crate::call_tree::{compute_function_timings, FunctionTiming};
use crate::error::Error;
use crate::filters::filter_thread_to_range;
use crate::memo::Memoized;
use crate::profile::Profile;
use crate::thread::Thread;
use crate::timestamp::Timestamp;

const DEFAULT_TOP_COUNT: usize = 10;

/// One entry of a top-functions summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSummary {
    pub name: String,
    pub total: f64,
    #[serde(rename = "self")]
    pub self_time: f64,
}

/// The structured result of one query command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum QueryResponse {
    RangePushed {
        start: f64,
        end: f64,
        depth: usize,
    },
    RangePopped {
        depth: usize,
    },
    TopFunctionsByTotal {
        functions: Vec<FunctionSummary>,
    },
    TopFunctionsBySelf {
        functions: Vec<FunctionSummary>,
    },
}

/// Executes query commands against one thread of a profile.
pub struct ProfileQuerier<'a> {
    profile: &'a Profile,
    thread_index: usize,
    range_stack: Vec<(Timestamp, Timestamp)>,
    timings: Memoized<Vec<(Timestamp, Timestamp)>, Vec<FunctionTiming>>,
}

impl<'a> ProfileQuerier<'a> {
    pub fn new(profile: &'a Profile, thread_index: usize) -> Result<Self, Error> {
        if thread_index >= profile.threads().len() {
            return Err(Error::InvalidThreadIndex(thread_index));
        }
        Ok(Self {
            profile,
            thread_index,
            range_stack: Vec::new(),
            timings: Memoized::new(),
        })
    }

    /// The currently viewed range: the innermost pushed range, or the whole
    /// profile. Range filtering is half-open, so the default view extends
    /// one sampling interval past the last event to include it.
    pub fn view_range(&self) -> (Timestamp, Timestamp) {
        self.range_stack.last().copied().unwrap_or_else(|| {
            let (start, end) = self.profile.time_range();
            let end =
                Timestamp::from_millis_since_reference(end.as_millis() + self.profile.meta.interval);
            (start, end)
        })
    }

    pub fn query(&mut self, command: &str) -> Result<QueryResponse, Error> {
        let command = command.trim();
        if command == "pop" {
            self.range_stack.pop();
            return Ok(QueryResponse::RangePopped {
                depth: self.range_stack.len(),
            });
        }
        if let Some(rest) = command.strip_prefix("top-total") {
            let count = parse_count(command, rest)?;
            return Ok(QueryResponse::TopFunctionsByTotal {
                functions: self.top_functions(count, |t| t.total),
            });
        }
        if let Some(rest) = command.strip_prefix("top-self") {
            let count = parse_count(command, rest)?;
            return Ok(QueryResponse::TopFunctionsBySelf {
                functions: self.top_functions(count, |t| t.self_time),
            });
        }
        if let Some((start, end)) = command.split_once(',') {
            let start: f64 = start
                .trim()
                .parse()
                .map_err(|_| Error::InvalidQuery(command.to_string()))?;
            let end: f64 = end
                .trim()
                .parse()
                .map_err(|_| Error::InvalidQuery(command.to_string()))?;
            if end < start {
                return Err(Error::InvalidQuery(command.to_string()));
            }
            // Nested ranges only narrow, never widen.
            let (view_start, view_end) = self.view_range();
            let start = Timestamp::from_millis_since_reference(start).max(view_start);
            let end = Timestamp::from_millis_since_reference(end).min(view_end);
            let end = end.max(start);
            self.range_stack.push((start, end));
            return Ok(QueryResponse::RangePushed {
                start: start.as_millis(),
                end: end.as_millis(),
                depth: self.range_stack.len(),
            });
        }
        Err(Error::InvalidQuery(command.to_string()))
    }

    fn top_functions(
        &mut self,
        count: usize,
        weight: impl Fn(&FunctionTiming) -> f64,
    ) -> Vec<FunctionSummary> {
        let profile = self.profile;
        let thread_index = self.thread_index;
        let timings = self
            .timings
            .get_or_insert_with(self.range_stack.clone(), |ranges| {
                let mut thread: Thread = profile.threads()[thread_index].clone();
                for (start, end) in ranges {
                    thread = filter_thread_to_range(&thread, *start, *end);
                }
                compute_function_timings(&thread)
            });

        let thread = &profile.threads()[thread_index];
        let mut entries: Vec<&FunctionTiming> = timings.iter().collect();
        entries.sort_by(|a, b| {
            weight(b)
                .partial_cmp(&weight(a))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.func.cmp(&b.func))
        });
        entries
            .into_iter()
            .take(count)
            .map(|t| FunctionSummary {
                name: thread.func_name(t.func).to_string(),
                total: t.total,
                self_time: t.self_time,
            })
            .collect()
    }
}

fn parse_count(command: &str, rest: &str) -> Result<usize, Error> {
    let rest = rest.trim();
    if rest.is_empty() {
        Ok(DEFAULT_TOP_COUNT)
    } else {
        rest.parse()
            .map_err(|_| Error::InvalidQuery(command.to_string()))
    }
}

//! Scenario replay.
//!
//! A scenario is a JSON document describing a viewport, a sequence of items
//! and a timeline of events. Replaying it drives a [`CloakedStrip`] over a
//! [`StripLayout`] on a virtual clock and records one [`PassRecord`] per
//! recomputation pass.
//!
//! ```json
//! {
//!   "viewport_width": 250,
//!   "items": [{"id": 1, "width": 100}, {"id": 2, "width": 180}],
//!   "events": [
//!     {"at_ms": 0, "action": "scroll", "offset": 120},
//!     {"at_ms": 40, "action": "append", "items": [{"id": 3}]}
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::CloakConfig;
use crate::host::SignalKind;
use crate::model::{Diagnostic, ScenarioError};
use crate::state::CloakedStrip;

use super::layout::StripLayout;

/// A replayable scenario.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Viewport width; must be positive.
    pub viewport_width: u32,
    /// Initial scroll offset.
    #[serde(default)]
    pub scroll_offset: f64,
    /// Initial items. Each renders `width` wide (100 when absent).
    #[serde(default)]
    pub items: Vec<Value>,
    /// Controller names the host can resolve.
    #[serde(default)]
    pub controllers: Vec<String>,
    /// Fixed elements by selector, with their outer widths.
    #[serde(default)]
    pub fixed_elements: BTreeMap<String, f64>,
    /// Wrapper scroll correction added to every slot offset.
    #[serde(default)]
    pub scroll_correction: f64,
    /// Timeline, replayed in `at_ms` order.
    #[serde(default)]
    pub events: Vec<TimedEvent>,
}

/// An action at a point on the virtual clock.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimedEvent {
    /// Milliseconds since the strip was attached.
    pub at_ms: u64,
    /// What happens.
    #[serde(flatten)]
    pub action: Action,
}

/// Something that happens to the viewport or the sequence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Scroll the viewport to `offset`.
    Scroll {
        /// New scroll offset.
        offset: f64,
    },
    /// Touch-drag the viewport to `offset`.
    TouchMove {
        /// New scroll offset.
        offset: f64,
    },
    /// Resize the viewport.
    Resize {
        /// New viewport width.
        width: f64,
    },
    /// Move the scrolling wrapper, changing the slot offset correction.
    Wrapper {
        /// New scroll correction.
        correction: f64,
    },
    /// Append items.
    Append {
        /// Items to append.
        items: Vec<Value>,
    },
    /// Insert items at `index`.
    Insert {
        /// Insertion point.
        index: usize,
        /// Items to insert.
        items: Vec<Value>,
    },
    /// Remove `count` items starting at `index`.
    Remove {
        /// First removed index.
        index: usize,
        /// Number of items removed.
        #[serde(default = "one")]
        count: usize,
    },
    /// Remove every item.
    Clear,
}

fn one() -> usize {
    1
}

/// Outcome of one recomputation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassRecord {
    /// Pass number, starting at 1.
    pub pass: usize,
    /// Virtual time of the pass.
    pub at_ms: u64,
    /// Leftmost on-screen item.
    pub leftmost: Option<Value>,
    /// Rightmost on-screen item.
    pub rightmost: Option<Value>,
    /// Indices of on-screen items.
    pub onscreen: Vec<usize>,
    /// Indices of uncloaked items after the batch settled.
    pub uncloaked: Vec<usize>,
    /// Indices of slots showing the loading markup.
    pub loading: Vec<usize>,
}

/// Records and diagnostics produced by a replay.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScenarioOutcome {
    /// One record per pass, in order.
    pub passes: Vec<PassRecord>,
    /// Non-fatal diagnostics raised during the replay.
    pub diagnostics: Vec<Diagnostic>,
}

/// Read a scenario from `path`, or from stdin when `path` is `-`.
pub fn load_scenario(path: &Path) -> Result<Scenario, ScenarioError> {
    let read_error = |source| ScenarioError::Read {
        path: path.to_path_buf(),
        source,
    };

    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(read_error)?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(read_error)?
    };

    parse_scenario(&raw, path)
}

/// Parse and validate scenario JSON. `path` is only used in errors.
pub fn parse_scenario(raw: &str, path: impl Into<PathBuf>) -> Result<Scenario, ScenarioError> {
    let path = path.into();
    let scenario: Scenario =
        serde_json::from_str(raw).map_err(|source| ScenarioError::Parse { path, source })?;

    if scenario.viewport_width == 0 {
        return Err(ScenarioError::EmptyViewport(scenario.viewport_width));
    }
    Ok(scenario)
}

type JsonStrip = CloakedStrip<Value, StripLayout<Value>>;

/// Replay `scenario` with `config` on a virtual clock.
///
/// The strip is attached at time 0. Before each event, debounce deadlines
/// that fall due are fired; sequence mutations settle immediately. After the
/// last event the clock runs until no deadline is pending.
pub fn run_scenario(scenario: &Scenario, config: CloakConfig) -> ScenarioOutcome {
    let base = Instant::now();

    let mut layout = StripLayout::for_json(f64::from(scenario.viewport_width));
    layout.set_scroll_offset(scenario.scroll_offset);
    layout.set_scroll_correction(scenario.scroll_correction);
    for name in &scenario.controllers {
        layout.register_controller(name.clone());
    }
    for (selector, width) in &scenario.fixed_elements {
        layout.set_fixed_element(selector.clone(), *width);
    }

    let mut strip = CloakedStrip::new(layout, config);
    strip.set_contents(scenario.items.iter().cloned());
    strip.attach();

    let mut replay = Replay {
        base,
        records: Vec::new(),
    };
    replay.settle(&mut strip, 0);

    let mut events = scenario.events.clone();
    events.sort_by_key(|event| event.at_ms);

    for event in events {
        replay.advance(&mut strip, Some(event.at_ms));
        let now = base + Duration::from_millis(event.at_ms);
        debug!(at_ms = event.at_ms, action = ?event.action, "replaying event");

        match event.action {
            Action::Scroll { offset } => {
                strip.host_mut().set_scroll_offset(offset);
                strip.signal(SignalKind::Scroll, now);
            }
            Action::TouchMove { offset } => {
                strip.host_mut().set_scroll_offset(offset);
                strip.signal(SignalKind::TouchMove, now);
            }
            Action::Resize { width } => {
                strip.host_mut().set_viewport_width(width);
                strip.signal(SignalKind::Resize, now);
            }
            Action::Wrapper { correction } => {
                strip.host_mut().set_scroll_correction(correction);
                strip.signal(SignalKind::WrapperGeometry, now);
            }
            Action::Append { items } => {
                let len = strip.len();
                strip.splice(len, 0, items);
            }
            Action::Insert { index, items } => {
                strip.splice(index, 0, items);
            }
            Action::Remove { index, count } => {
                strip.splice(index, count, std::iter::empty::<Value>());
            }
            Action::Clear => strip.clear(),
        }

        replay.settle(&mut strip, event.at_ms);
    }

    replay.advance(&mut strip, None);

    info!(
        passes = replay.records.len(),
        items = strip.len(),
        "scenario replayed"
    );

    let diagnostics = strip.take_diagnostics();
    strip.destroy();

    ScenarioOutcome {
        passes: replay.records,
        diagnostics,
    }
}

struct Replay {
    base: Instant,
    records: Vec<PassRecord>,
}

impl Replay {
    /// Fire every debounce deadline up to `until_ms` (all of them if `None`).
    fn advance(&mut self, strip: &mut JsonStrip, until_ms: Option<u64>) {
        while let Some(deadline) = strip.next_deadline() {
            let at_ms = deadline.saturating_duration_since(self.base).as_millis() as u64;
            if until_ms.is_some_and(|until| at_ms > until) {
                break;
            }
            strip.tick(deadline);
            self.settle(strip, at_ms);
        }
    }

    fn settle(&mut self, strip: &mut JsonStrip, at_ms: u64) {
        strip.settle();
        if strip.passes() > self.records.len() {
            self.records.push(record(strip, at_ms));
        }
    }
}

fn record(strip: &JsonStrip, at_ms: u64) -> PassRecord {
    let report = strip.report();
    let indices = |keep: &dyn Fn(usize) -> bool| -> Vec<usize> {
        (0..strip.len()).filter(|&i| keep(i)).collect()
    };

    PassRecord {
        pass: strip.passes(),
        at_ms,
        leftmost: report.leftmost().map(|c| Value::clone(c)),
        rightmost: report.rightmost().map(|c| Value::clone(c)),
        onscreen: strip
            .last_classification()
            .map(|c| c.onscreen.clone().collect())
            .unwrap_or_default(),
        uncloaked: indices(&|i| strip.items()[i].is_uncloaked()),
        loading: indices(&|i| strip.items()[i].is_loading()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(widths: &[u64]) -> Vec<Value> {
        widths
            .iter()
            .enumerate()
            .map(|(i, w)| serde_json::json!({"id": i, "width": w}))
            .collect()
    }

    fn scenario(events: Vec<TimedEvent>) -> Scenario {
        Scenario {
            viewport_width: 250,
            scroll_offset: 0.0,
            items: items(&[100; 10]),
            controllers: Vec::new(),
            fixed_elements: BTreeMap::new(),
            scroll_correction: 0.0,
            events,
        }
    }

    fn at(at_ms: u64, action: Action) -> TimedEvent {
        TimedEvent { at_ms, action }
    }

    #[test]
    fn parse_minimal_scenario() {
        let scenario = parse_scenario(r#"{"viewport_width": 300}"#, "inline").unwrap();
        assert_eq!(scenario.viewport_width, 300);
        assert!(scenario.items.is_empty());
        assert!(scenario.events.is_empty());
    }

    #[test]
    fn parse_tagged_events() {
        let raw = r#"{
            "viewport_width": 250,
            "events": [
                {"at_ms": 5, "action": "scroll", "offset": 120},
                {"at_ms": 6, "action": "remove", "index": 2},
                {"at_ms": 7, "action": "clear"}
            ]
        }"#;
        let scenario = parse_scenario(raw, "inline").unwrap();
        assert_eq!(
            scenario.events,
            vec![
                at(5, Action::Scroll { offset: 120.0 }),
                at(6, Action::Remove { index: 2, count: 1 }),
                at(7, Action::Clear),
            ]
        );
    }

    #[test]
    fn zero_viewport_is_rejected() {
        let err = parse_scenario(r#"{"viewport_width": 0}"#, "inline").unwrap_err();
        assert!(matches!(err, ScenarioError::EmptyViewport(0)));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = parse_scenario(r#"{"viewport_width": 10, "height": 3}"#, "s.json").unwrap_err();
        assert!(matches!(err, ScenarioError::Parse { .. }));
        assert!(err.to_string().contains("s.json"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_scenario(Path::new("/nonexistent/scenario.json")).unwrap_err();
        assert!(matches!(err, ScenarioError::Read { .. }));
    }

    #[test]
    fn initial_pass_is_recorded_at_time_zero() {
        let outcome = run_scenario(&scenario(Vec::new()), CloakConfig::default());

        assert_eq!(outcome.passes.len(), 1);
        let first = &outcome.passes[0];
        assert_eq!(first.pass, 1);
        assert_eq!(first.at_ms, 0);
        assert_eq!(first.onscreen, vec![0, 1, 2]);
        assert_eq!(first.uncloaked, vec![0, 1, 2, 3, 4]);
        assert_eq!(first.loading, vec![5]);
        assert_eq!(first.leftmost, Some(serde_json::json!({"id": 0, "width": 100})));
        assert_eq!(first.rightmost, Some(serde_json::json!({"id": 2, "width": 100})));
    }

    #[test]
    fn scroll_burst_is_one_pass_after_the_window() {
        let events = (0..5)
            .map(|i| {
                at(
                    i * 2,
                    Action::Scroll {
                        offset: 100.0 * (i + 1) as f64,
                    },
                )
            })
            .collect();
        let outcome = run_scenario(&scenario(events), CloakConfig::default());

        assert_eq!(outcome.passes.len(), 2);
        let second = &outcome.passes[1];
        assert_eq!(second.at_ms, 18);
        // window [500, 750), band [250, 1000)
        assert_eq!(second.onscreen, vec![5, 6, 7]);
        assert_eq!(second.uncloaked, vec![2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn clearing_reports_no_boundaries() {
        let outcome = run_scenario(
            &scenario(vec![at(30, Action::Clear)]),
            CloakConfig::default(),
        );

        let last = outcome.passes.last().unwrap();
        assert_eq!(last.at_ms, 30);
        assert_eq!(last.leftmost, None);
        assert_eq!(last.rightmost, None);
        assert!(last.onscreen.is_empty());
        assert!(last.uncloaked.is_empty());
    }

    #[test]
    fn unknown_controller_is_reported() {
        let config = CloakConfig {
            item_controller: Some("foo".to_string()),
            ..CloakConfig::default()
        };
        let outcome = run_scenario(&scenario(Vec::new()), config);

        assert_eq!(outcome.passes[0].uncloaked, vec![0, 1, 2, 3, 4]);
        assert_eq!(outcome.diagnostics.len(), 5);
    }

    #[test]
    fn registered_controller_raises_no_diagnostic() {
        let config = CloakConfig {
            item_controller: Some("post".to_string()),
            ..CloakConfig::default()
        };
        let mut s = scenario(Vec::new());
        s.controllers.push("post".to_string());

        let outcome = run_scenario(&s, config);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn pass_record_serializes_as_one_json_object() {
        let outcome = run_scenario(&scenario(Vec::new()), CloakConfig::default());
        let line = serde_json::to_string(&outcome.passes[0]).unwrap();

        insta::assert_snapshot!(line, @r#"{"pass":1,"at_ms":0,"leftmost":{"id":0,"width":100},"rightmost":{"id":2,"width":100},"onscreen":[0,1,2],"uncloaked":[0,1,2,3,4],"loading":[5]}"#);
    }
}

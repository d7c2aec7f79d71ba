//! Property-based tests for the cloaking engine.
//!
//! Tests validate, for arbitrary widths, viewports and scroll offsets:
//! 1. On-screen items are uncloaked once the batch settles
//! 2. Items outside the rendered band are cloaked
//! 3. The reported boundaries are the ends of the on-screen run
//! 4. Cloaking never changes a slot's width

use std::rc::Rc;

use cloakline::sim::StripLayout;
use cloakline::{CloakConfig, CloakedStrip, GeometryProvider};
use proptest::prelude::*;
use serde_json::{json, Value};

type JsonStrip = CloakedStrip<Value, StripLayout<Value>>;

fn strip(widths: &[u64], viewport: u32, slack_ratio: f64) -> JsonStrip {
    let config = CloakConfig {
        slack_ratio,
        ..CloakConfig::default()
    };
    let mut strip = CloakedStrip::new(StripLayout::for_json(f64::from(viewport)), config);
    strip.set_contents(
        widths
            .iter()
            .enumerate()
            .map(|(i, w)| json!({"id": i, "width": w})),
    );
    strip
}

fn json_width(content: &Value) -> f64 {
    content["width"].as_u64().unwrap() as f64
}

proptest! {
    #[test]
    fn settled_pass_matches_its_classification(
        widths in prop::collection::vec(1u64..400, 0..60),
        viewport in 50u32..800,
        scroll in 0u32..10_000,
        slack_ratio in 0.1f64..2.0,
    ) {
        let mut strip = strip(&widths, viewport, slack_ratio);
        strip.host_mut().set_scroll_offset(f64::from(scroll));
        strip.attach();
        strip.settle();

        let Some(c) = strip.last_classification().cloned() else {
            prop_assert!(widths.is_empty());
            prop_assert!(strip.report().is_empty());
            return Ok(());
        };

        for i in c.onscreen.clone() {
            prop_assert!(strip.items()[i].is_uncloaked(), "on-screen item {} is cloaked", i);
        }
        for i in c.cloak_indices() {
            prop_assert!(!strip.items()[i].is_uncloaked(), "item {} outside the band is uncloaked", i);
        }

        let report = strip.report();
        prop_assert_eq!(report.onscreen().len(), c.onscreen.len());
        if let (Some(left), Some(right)) = (report.leftmost(), report.rightmost()) {
            prop_assert!(Rc::ptr_eq(left, strip.items()[c.onscreen.start].content()));
            prop_assert!(Rc::ptr_eq(right, strip.items()[c.onscreen.end - 1].content()));
        } else {
            prop_assert!(c.nothing_onscreen());
        }
    }

    #[test]
    fn cloaking_keeps_rendered_width(
        widths in prop::collection::vec(1u64..400, 1..60),
        viewport in 50u32..800,
        first in 0u32..10_000,
        second in 0u32..10_000,
    ) {
        let mut strip = strip(&widths, viewport, 1.0);
        strip.host_mut().set_scroll_offset(f64::from(first));
        strip.attach();
        strip.settle();

        let rendered: Vec<_> = strip
            .items()
            .iter()
            .filter(|item| item.is_uncloaked())
            .map(|item| (item.key(), json_width(item.content())))
            .collect();

        strip.host_mut().set_scroll_offset(f64::from(second));
        strip.scroll_triggered();
        strip.settle();

        for (key, width) in rendered {
            prop_assert_eq!(strip.host().width(key), width);
        }
    }
}

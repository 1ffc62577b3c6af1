// Copyright 2026 the Repaint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Paint cycles become duration slices on the paint track. Flushes that
//! complete asynchronously become async slices keyed by their token serial,
//! so an overlong swap is visible as a bar spanning the cycles it delayed.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use kurbo::Rect;
use serde_json::{Value, json};

use repaint_core::backend::FlushStatus;

use crate::recorder::{Record, RecordedEvent, decode};

const TID_DAMAGE: u32 = 0;
const TID_PAINT: u32 = 1;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let events: Vec<Value> = decode(bytes).filter_map(to_trace_event).collect();
    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn to_trace_event(record: Record) -> Option<Value> {
    let ts = ns_to_us(record.timestamp_ns);
    let event = match record.event {
        RecordedEvent::Damage(e) => json!({
            "ph": "i",
            "name": format!("{:?}", e.kind),
            "cat": "Damage",
            "ts": ts,
            "pid": 0,
            "tid": TID_DAMAGE,
            "s": "t",
            "args": {
                "rect": rect_args(e.rect),
                "dx": e.delta.x,
                "dy": e.delta.y,
                "generation": e.generation.0,
            }
        }),
        RecordedEvent::WakeupScheduled { serial, generation } => json!({
            "ph": "i",
            "name": "WakeupScheduled",
            "cat": "Scheduler",
            "ts": ts,
            "pid": 0,
            "tid": TID_DAMAGE,
            "s": "t",
            "args": {
                "serial": serial,
                "generation": generation.0,
            }
        }),
        RecordedEvent::Wakeup {
            serial,
            generation,
            has_update,
        } => json!({
            "ph": "i",
            "name": "Wakeup",
            "cat": "Scheduler",
            "ts": ts,
            "pid": 0,
            "tid": TID_PAINT,
            "s": "t",
            "args": {
                "serial": serial,
                "generation": generation.0,
                "has_update": has_update,
            }
        }),
        RecordedEvent::PaintBegin(e) => json!({
            "ph": "B",
            "name": "Paint",
            "cat": "Paint",
            "ts": ts,
            "pid": 0,
            "tid": TID_PAINT,
            "args": {
                "cycle": e.cycle,
                "generation": e.generation.0,
                "rects": e.rect_count,
                "bounds": rect_args(e.bounds),
                "scroll": e.scroll.map(|s| json!({
                    "rect": rect_args(s.rect),
                    "dx": s.delta.x,
                    "dy": s.delta.y,
                })),
            }
        }),
        RecordedEvent::PaintEnd(e) => json!({
            "ph": "E",
            "name": "Paint",
            "cat": "Paint",
            "ts": ts,
            "pid": 0,
            "tid": TID_PAINT,
            "args": {
                "cycle": e.cycle,
                "painted": e.painted,
            }
        }),
        RecordedEvent::Flush {
            cycle,
            serial,
            generation,
            status: FlushStatus::Pending,
        } => json!({
            "ph": "b",
            "name": "Flush",
            "cat": "Flush",
            "id": serial,
            "ts": ts,
            "pid": 0,
            "tid": TID_PAINT,
            "args": {
                "cycle": cycle,
                "generation": generation.0,
            }
        }),
        RecordedEvent::Flush {
            cycle,
            serial,
            generation,
            status,
        } => json!({
            "ph": "i",
            "name": "Flush",
            "cat": "Flush",
            "ts": ts,
            "pid": 0,
            "tid": TID_PAINT,
            "s": "t",
            "args": {
                "cycle": cycle,
                "serial": serial,
                "generation": generation.0,
                "status": format!("{status:?}"),
            }
        }),
        RecordedEvent::FlushComplete {
            serial,
            generation,
            has_update,
        } => json!({
            "ph": "e",
            "name": "Flush",
            "cat": "Flush",
            "id": serial,
            "ts": ts,
            "pid": 0,
            "tid": TID_PAINT,
            "args": {
                "generation": generation.0,
                "has_update": has_update,
            }
        }),
        RecordedEvent::StaleCallback(e) => json!({
            "ph": "i",
            "name": "StaleCallback",
            "cat": "Scheduler",
            "ts": ts,
            "pid": 0,
            "tid": TID_PAINT,
            "s": "t",
            "args": {
                "kind": format!("{:?}", e.kind),
                "serial": e.serial,
                "issued": e.issued.0,
                "current": e.current.0,
            }
        }),
        RecordedEvent::Resize(e) => json!({
            "ph": "i",
            "name": "Resize",
            "cat": "Surface",
            "ts": ts,
            "pid": 0,
            "tid": TID_PAINT,
            "s": "g",
            "args": {
                "width": e.size.width,
                "height": e.size.height,
                "generation": e.generation.0,
                "allocated": e.allocated,
            }
        }),
        // Counts only; the paint slice already carries the rect count.
        RecordedEvent::PaintRectsCount { .. } => return None,
    };
    Some(event)
}

fn rect_args(r: Rect) -> Value {
    json!([r.x0, r.y0, r.width(), r.height()])
}

fn ns_to_us(ns: u64) -> f64 {
    ns as f64 / 1000.0
}

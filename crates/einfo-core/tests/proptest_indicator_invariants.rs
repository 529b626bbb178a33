//! Property-based invariant tests for indicator placement.
//!
//! 1. Non-terminal output is exactly `" [ ok ]\n"` or `" [ !! ]\n"`.
//! 2. The eterm correction shifts every indent by exactly one column.
//! 3. A right-aligned indicator ends at the last usable column.
//! 4. A resize between snapshot and placement never emits positioning bytes.

use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use einfo_core::capability::GradeConfig;
use einfo_core::cursor::contains_positioning;
use einfo_core::indicator::{INDICATOR_COLUMNS, indicator_indent};
use einfo_core::style::Palette;
use einfo_core::{
    CapabilityGrader, CprError, CursorPosition, Dimensions, IndicatorPlacer, IndicatorRequest,
    Placement, TerminalProbe, TerminalState, TtyLevel,
};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

struct Probe {
    terminal: bool,
    dimensions: Dimensions,
    cursors: VecDeque<CursorPosition>,
}

impl TerminalProbe for Probe {
    fn is_terminal(&self) -> bool {
        self.terminal
    }

    fn is_stderr_terminal(&self) -> bool {
        self.terminal
    }

    fn dimensions(&mut self) -> io::Result<Dimensions> {
        Ok(self.dimensions)
    }

    fn cursor_position(&mut self) -> Result<CursorPosition, CprError> {
        self.cursors.pop_front().ok_or(CprError::NoReply)
    }
}

fn grader() -> CapabilityGrader {
    CapabilityGrader::new(
        GradeConfig {
            throttle: Duration::ZERO,
        },
        false,
    )
}

fn smart_state(dims: Dimensions, cursor: CursorPosition) -> TerminalState {
    TerminalState {
        level: TtyLevel::Smart,
        dimensions: Some(dims),
        cursor: Some(cursor),
        last_probe: Some(Instant::now()),
        pending_newline: false,
    }
}

fn dims_strategy() -> impl Strategy<Value = Dimensions> {
    (1u16..=500, 8u16..=500).prop_filter_map("positive", |(r, c)| Dimensions::new(r, c))
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Plain output on non-terminals
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn non_terminal_output_is_exact(code in 0i32..=255, colors in any::<bool>(), offset in -1i32..=0) {
        let placer = IndicatorPlacer::new(Palette::new(colors), offset);
        let mut probe = Probe {
            terminal: false,
            dimensions: Dimensions { rows: 24, cols: 80 },
            cursors: VecDeque::new(),
        };
        let mut state = TerminalState::default();
        let mut out = Vec::new();
        let request = IndicatorRequest::new(code, None).unwrap();

        let placement = placer
            .place(&mut out, &mut state, &grader(), &mut probe, request)
            .unwrap();

        prop_assert_eq!(placement, Placement::Plain);
        let expected: &[u8] = if code == 0 { b" [ ok ]\n" } else { b" [ !! ]\n" };
        prop_assert_eq!(out.as_slice(), expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Eterm correction
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn eterm_offset_is_one_column(cols in any::<u16>(), col in any::<u16>()) {
        prop_assert_eq!(indicator_indent(cols, col, -1), indicator_indent(cols, col, 0) - 1);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Right alignment
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn aligned_indicator_ends_at_edge(
        dims in dims_strategy(),
        col_seed in any::<prop::sample::Index>(),
        row_seed in any::<prop::sample::Index>(),
        offset in -1i32..=0,
    ) {
        let col = u16::try_from(col_seed.index(usize::from(dims.cols)) + 1).unwrap();
        let row = u16::try_from(row_seed.index(usize::from(dims.rows)) + 1).unwrap();
        let cursor = CursorPosition::new(row, col).unwrap();

        let placer = IndicatorPlacer::new(Palette::plain(), offset);
        let mut probe = Probe {
            terminal: true,
            dimensions: dims,
            cursors: VecDeque::from([cursor]),
        };
        let mut state = smart_state(dims, cursor);
        let mut out = Vec::new();

        let placement = placer
            .place(&mut out, &mut state, &grader(), &mut probe, IndicatorRequest::new(0, None).unwrap())
            .unwrap();

        let edge = i32::from(dims.cols) - INDICATOR_COLUMNS + offset;
        match placement {
            Placement::Aligned { column } => {
                prop_assert!(column > col);
                prop_assert_eq!(i32::from(column), edge);
            }
            Placement::InPlace => prop_assert_eq!(i32::from(col), edge),
            Placement::Wrapped { column } => {
                prop_assert!(i32::from(col) > edge);
                prop_assert_eq!(i32::from(column), edge.max(1));
            }
            Placement::Plain => prop_assert!(false, "positioned path expected"),
        }
        prop_assert!(out.ends_with(b" [ ok ]\n"));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Resize forces plain output
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn resize_never_positions(
        before in dims_strategy(),
        after in dims_strategy(),
        row in 1u16..=24,
        col in 1u16..=80,
    ) {
        prop_assume!(before != after);
        let cursor = CursorPosition::new(row, col).unwrap();
        let placer = IndicatorPlacer::new(Palette::plain(), 0);
        let mut probe = Probe {
            terminal: true,
            dimensions: after,
            cursors: VecDeque::from([cursor]),
        };
        let mut state = smart_state(before, cursor);
        let mut out = Vec::new();

        let placement = placer
            .place(&mut out, &mut state, &grader(), &mut probe, IndicatorRequest::new(0, None).unwrap())
            .unwrap();

        prop_assert_eq!(placement, Placement::Plain);
        prop_assert!(!contains_positioning(&out));
        prop_assert_eq!(probe.cursors.len(), 1);
    }
}

use std::collections::HashMap;
use std::time::{Duration, Instant};

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph},
    Frame,
};

use crate::startup::presence::{Presence, PresenceDiff, TransitionSpec};
use crate::startup::progress::{ReadinessState, StepId};
use crate::theme::Theme;

const OVERLAY_KEY: &str = "loader";
const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SPINNER_INTERVAL_MS: u128 = 80;

/// Row state indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Pending,
    Complete,
}

impl Indicator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Indicator::Pending => "…",
            Indicator::Complete => "✓",
        }
    }
}

/// One step row, keyed on the step id
#[derive(Debug, Clone, PartialEq)]
pub struct RowNode {
    pub key: StepId,
    pub message: String,
    pub indicator: Indicator,
    pub completed_after: Option<Duration>,
    pub transition: TransitionSpec,
}

impl RowNode {
    pub fn line(&self) -> String {
        match self.completed_after {
            Some(after) if self.indicator == Indicator::Complete => format!(
                "{} {} ({:.1}s)",
                self.indicator.symbol(),
                self.message,
                after.as_secs_f64()
            ),
            _ => format!("{} {}", self.indicator.symbol(), self.message),
        }
    }
}

/// The loader overlay, keyed on the overall readiness flag
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayNode {
    pub key: bool,
    pub mounted: bool,
    pub title: String,
    pub progress: f64,
    pub transition: TransitionSpec,
}

/// Output of a render pass
#[derive(Debug, Clone, PartialEq)]
pub struct ViewTree {
    pub overlay: OverlayNode,
    pub rows: Vec<RowNode>,
}

impl ViewTree {
    pub fn row_keys(&self) -> Vec<StepId> {
        self.rows.iter().map(|row| row.key.clone()).collect()
    }

    pub fn lines(&self) -> Vec<String> {
        self.rows.iter().map(RowNode::line).collect()
    }
}

/// Change between two successive row lists
#[derive(Debug, Clone, PartialEq)]
pub enum RowChange {
    Entered(RowNode),
    Completed(RowNode),
    Exited(StepId),
}

/// Keyed list diff between two renders, in display order
pub fn diff_rows(previous: &[RowNode], next: &[RowNode]) -> Vec<RowChange> {
    let mut changes: Vec<RowChange> = previous
        .iter()
        .filter(|old| !next.iter().any(|row| row.key == old.key))
        .map(|old| RowChange::Exited(old.key.clone()))
        .collect();

    for row in next {
        match previous.iter().find(|old| old.key == row.key) {
            None => changes.push(RowChange::Entered(row.clone())),
            Some(old) if old.indicator != row.indicator => {
                changes.push(RowChange::Completed(row.clone()))
            }
            Some(_) => {}
        }
    }
    changes
}

/// Loader overlay listing the visible steps of a loading session
pub struct LoaderView {
    title: String,
    transitions: TransitionSpec,
    overlay: Presence<&'static str>,
    rows: Presence<StepId>,
    row_cache: HashMap<StepId, RowNode>,
    tree: Option<ViewTree>,
}

impl LoaderView {
    pub fn new(title: impl Into<String>, transitions: TransitionSpec) -> Self {
        Self {
            title: title.into(),
            transitions,
            overlay: Presence::new(transitions),
            rows: Presence::new(transitions),
            row_cache: HashMap::new(),
            tree: None,
        }
    }

    /// Build the view tree for a state. Pure; nothing is retained.
    pub fn render(&self, state: &ReadinessState) -> ViewTree {
        let rows = state
            .visible_steps
            .iter()
            .map(|step| RowNode {
                key: step.id().clone(),
                message: step.message().to_string(),
                indicator: if step.is_done() {
                    Indicator::Complete
                } else {
                    Indicator::Pending
                },
                completed_after: step.completed_after(),
                transition: self.transitions,
            })
            .collect();

        ViewTree {
            overlay: OverlayNode {
                key: state.all_ready,
                mounted: !state.all_ready,
                title: self.title.clone(),
                progress: state.progress_percentage(),
                transition: self.transitions,
            },
            rows,
        }
    }

    /// Mount a view tree, starting the transitions it implies at `now`
    pub fn apply(&mut self, tree: ViewTree, now: Instant) -> PresenceDiff<StepId> {
        let overlay_keys: &[&'static str] = if tree.overlay.mounted {
            &[OVERLAY_KEY]
        } else {
            &[]
        };
        let overlay_diff = self.overlay.sync(overlay_keys, now);
        if !overlay_diff.exited.is_empty() {
            tracing::debug!("Loader overlay exiting");
        }

        for row in &tree.rows {
            self.row_cache.insert(row.key.clone(), row.clone());
        }
        let diff = self.rows.sync(&tree.row_keys(), now);
        self.row_cache.retain(|key, _| self.rows.contains(key));

        self.tree = Some(tree);
        diff
    }

    /// Render and mount in one step
    pub fn update(&mut self, state: &ReadinessState, now: Instant) -> PresenceDiff<StepId> {
        let tree = self.render(state);
        self.apply(tree, now)
    }

    /// Drop finished exit transitions
    pub fn tick(&mut self, now: Instant) {
        self.overlay.prune(now);
        self.rows.prune(now);
        self.row_cache.retain(|key, _| self.rows.contains(key));
    }

    pub fn tree(&self) -> Option<&ViewTree> {
        self.tree.as_ref()
    }

    pub fn overlay_opacity(&self, now: Instant) -> f64 {
        self.overlay.opacity(&OVERLAY_KEY, now).unwrap_or(0.0)
    }

    pub fn row_opacity(&self, key: &StepId, now: Instant) -> Option<f64> {
        self.rows.opacity(key, now)
    }

    /// True once readiness was reached and the overlay finished its exit
    pub fn is_dismissed(&self, now: Instant) -> bool {
        match &self.tree {
            Some(tree) => !tree.overlay.mounted && self.overlay_opacity(now) <= 0.0,
            None => false,
        }
    }

    /// Paint the overlay into `area`
    pub fn draw(&self, frame: &mut Frame, area: Rect, theme: &Theme, elapsed: Duration, now: Instant) {
        let Some(tree) = &self.tree else {
            return;
        };
        let opacity = self.overlay_opacity(now);
        if opacity <= 0.0 {
            return;
        }
        let palette = &theme.palette;

        let popup_area = centered_rect(60, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(format!(" {} ", tree.overlay.title))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(theme.faded(palette.border, opacity))
            .style(ratatui::style::Style::default().bg(palette.background));

        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Progress
                Constraint::Min(1),    // Steps
                Constraint::Length(1), // Footer
            ])
            .split(inner.inner(&Margin {
                vertical: 0,
                horizontal: 1,
            }));

        let gauge_color = if tree.overlay.key {
            palette.success
        } else {
            palette.accent
        };
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::BOTTOM).border_style(theme.faded(palette.border, opacity)))
            .gauge_style(theme.faded(gauge_color, opacity).add_modifier(Modifier::BOLD))
            .percent(tree.overlay.progress.clamp(0.0, 100.0) as u16)
            .label(format!("{:.0}%", tree.overlay.progress));
        frame.render_widget(gauge, chunks[0]);

        let spinner = SPINNER_FRAMES[(elapsed.as_millis() / SPINNER_INTERVAL_MS) as usize % SPINNER_FRAMES.len()];
        let items: Vec<ListItem> = self
            .rows
            .visible(now)
            .into_iter()
            .filter_map(|(key, row_opacity)| {
                let row = self.row_cache.get(&key)?;
                let opacity = opacity * row_opacity;
                let (icon, icon_color) = match row.indicator {
                    Indicator::Pending => (spinner, palette.accent),
                    Indicator::Complete => (Indicator::Complete.symbol(), palette.success),
                };

                let mut spans = vec![
                    Span::styled(icon, theme.faded(icon_color, opacity)),
                    Span::raw(" "),
                    Span::styled(row.message.clone(), theme.faded(palette.text_primary, opacity)),
                ];
                if let (Indicator::Complete, Some(after)) = (row.indicator, row.completed_after) {
                    spans.push(Span::styled(
                        format!(" ({:.1}s)", after.as_secs_f64()),
                        theme.faded(palette.text_muted, opacity),
                    ));
                }
                Some(ListItem::new(Line::from(spans)))
            })
            .collect();
        frame.render_widget(List::new(items), chunks[1]);

        let footer = Paragraph::new(Line::from(vec![Span::styled(
            format!("Elapsed: {:.1}s  |  q to quit", elapsed.as_secs_f64()),
            theme.faded(palette.text_secondary, opacity),
        )]))
        .alignment(Alignment::Center);
        frame.render_widget(footer, chunks[2]);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::startup::progress::Step;

    fn state(steps: &[Step]) -> ReadinessState {
        ReadinessState::derive(steps)
    }

    fn view() -> LoaderView {
        LoaderView::new(
            "Loading",
            TransitionSpec::new(Duration::from_millis(100), Duration::from_millis(200)),
        )
    }

    #[test]
    fn test_render_rows_follow_visible_steps() {
        let view = view();
        let mut steps = vec![Step::new("a", "Config"), Step::new("b", "Cache"), Step::new("c", "Index")];
        steps[0].mark_done(Duration::from_millis(1500));

        let tree = view.render(&state(&steps));
        assert!(tree.overlay.mounted);
        assert!(!tree.overlay.key);
        assert_eq!(tree.row_keys(), vec![StepId::new("a"), StepId::new("b")]);
        assert_eq!(tree.rows[0].indicator, Indicator::Complete);
        assert_eq!(tree.rows[1].indicator, Indicator::Pending);
        assert_eq!(tree.lines(), vec!["✓ Config (1.5s)", "… Cache"]);
    }

    #[test]
    fn test_render_is_pure() {
        let view = view();
        let steps = vec![Step::new("a", "Config")];
        assert_eq!(view.render(&state(&steps)), view.render(&state(&steps)));
        assert!(view.tree().is_none());
    }

    #[test]
    fn test_render_ready_unmounts_overlay() {
        let view = view();
        let tree = view.render(&state(&[Step::completed("a", "Config")]));
        assert!(tree.overlay.key);
        assert!(!tree.overlay.mounted);
        assert_eq!(tree.overlay.progress, 100.0);
    }

    #[test]
    fn test_diff_rows() {
        let view = view();
        let mut steps = vec![Step::new("a", "Config"), Step::new("b", "Cache")];
        let first = view.render(&state(&steps));

        steps[0].mark_done(Duration::from_millis(10));
        let second = view.render(&state(&steps));

        let changes = diff_rows(&first.rows, &second.rows);
        assert_eq!(changes.len(), 2);
        assert!(matches!(&changes[0], RowChange::Completed(row) if row.key.as_str() == "a"));
        assert!(matches!(&changes[1], RowChange::Entered(row) if row.key.as_str() == "b"));

        assert_eq!(
            diff_rows(&second.rows, &first.rows[..0]),
            vec![
                RowChange::Exited(StepId::new("a")),
                RowChange::Exited(StepId::new("b")),
            ]
        );
        assert!(diff_rows(&second.rows, &second.rows).is_empty());
    }

    #[test]
    fn test_overlay_exit_then_dismissed() {
        let mut view = view();
        let start = Instant::now();
        let mut steps = vec![Step::new("a", "Config")];

        view.update(&state(&steps), start);
        assert!(!view.is_dismissed(start));
        assert_eq!(view.overlay_opacity(start), 0.0);
        assert_eq!(view.overlay_opacity(start + Duration::from_millis(100)), 1.0);

        steps[0].mark_done(Duration::from_millis(10));
        let ready_at = start + Duration::from_millis(500);
        view.update(&state(&steps), ready_at);
        assert!(!view.is_dismissed(ready_at));
        assert!(view.overlay_opacity(ready_at + Duration::from_millis(100)) > 0.0);

        let done = ready_at + Duration::from_millis(200);
        assert!(view.is_dismissed(done));
        view.tick(done);
        assert_eq!(view.overlay_opacity(done), 0.0);
    }

    #[test]
    fn test_rows_keep_transition_across_updates() {
        let mut view = view();
        let start = Instant::now();
        let mut steps = vec![Step::new("a", "Config"), Step::new("b", "Cache")];

        let diff = view.update(&state(&steps), start);
        assert_eq!(diff.entered, vec![StepId::new("a")]);

        steps[0].mark_done(Duration::from_millis(10));
        let later = start + Duration::from_millis(150);
        let diff = view.update(&state(&steps), later);
        assert_eq!(diff.entered, vec![StepId::new("b")]);
        assert_eq!(view.row_opacity(&StepId::new("a"), later), Some(1.0));
        assert_eq!(view.row_opacity(&StepId::new("b"), later), Some(0.0));
    }

    #[test]
    fn test_ready_at_start_is_dismissed_immediately() {
        let mut view = view();
        let now = Instant::now();
        view.update(&state(&[]), now);
        assert!(view.is_dismissed(now));
    }
}

//! Enumerable Renderer
//!
//! Renders sequences, maps and grids as `{a,b,c}`. Long sequences can be
//! windowed around a highlighted item:
//!
//! ```text
//! {...,5,6,7,8,9,10,11,12,13,14,*15*,16,17,18,19,20,21,22,23,24,...} (53 items)
//! ```
//!
//! A sequence reached again while it is still being rendered (a list that
//! contains itself) renders as `{...}` instead of recursing.

use crate::format::{Formatter, CYCLE_PLACEHOLDER};
use crate::inspect::{Graph, Kind, NodeId};
use crate::settings::Settings;

const ELLIPSIS: &str = "...";

/// `(N items)`, singular for zero or one item
#[must_use]
pub fn count_suffix(count: usize) -> String {
    if count <= 1 {
        format!("({count} item)")
    } else {
        format!("({count} items)")
    }
}

/// Number of items of a sequence, map or grid
#[must_use]
pub fn item_count(graph: &Graph, id: NodeId) -> Option<usize> {
    match &graph.node(id).kind {
        Kind::Sequence(items) | Kind::Grid { items, .. } => Some(items.len()),
        Kind::Map(pairs) => Some(pairs.len()),
        _ => None,
    }
}

/// Visible range of a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct View {
    first: usize,
    last: usize,
    highlight: Option<usize>,
}

impl View {
    fn compute(len: usize, highlight: Option<usize>, window: Option<usize>) -> Self {
        let highlight = highlight.filter(|_| len > 0).map(|h| h.min(len - 1));
        let (first, last) = match window {
            Some(size) if size > 0 && len > size => {
                let center = highlight.unwrap_or(0);
                let first = center.saturating_sub(size / 2).min(len - size);
                (first, first + size)
            }
            _ => (0, len),
        };
        Self {
            first,
            last,
            highlight: highlight.filter(|_| last - first > 1),
        }
    }

    const fn contains(&self, index: usize) -> bool {
        index >= self.first && index < self.last
    }
}

/// Renders enumerable values
#[derive(Debug, Clone, Copy)]
pub struct EnumerableRenderer<'s> {
    settings: &'s Settings,
}

impl<'s> EnumerableRenderer<'s> {
    /// Create a renderer for the given settings
    #[must_use]
    pub const fn new(settings: &'s Settings) -> Self {
        Self { settings }
    }

    /// Render a node, optionally windowed around `highlight`.
    ///
    /// `window` of `None` or `Some(0)` shows every item. Non-enumerable
    /// nodes fall back to the value formatter.
    #[must_use]
    pub fn render(
        &self,
        graph: &Graph,
        id: NodeId,
        highlight: Option<usize>,
        window: Option<usize>,
    ) -> String {
        self.render_at(graph, id, highlight, window, &mut Vec::new())
    }

    /// [`render`](Self::render) followed by the item count suffix
    #[must_use]
    pub fn render_with_count(
        &self,
        graph: &Graph,
        id: NodeId,
        highlight: Option<usize>,
        window: Option<usize>,
    ) -> String {
        let text = self.render(graph, id, highlight, window);
        match item_count(graph, id) {
            Some(count) => format!("{text} {}", count_suffix(count)),
            None => text,
        }
    }

    pub(crate) fn render_at(
        &self,
        graph: &Graph,
        id: NodeId,
        highlight: Option<usize>,
        window: Option<usize>,
        ancestors: &mut Vec<NodeId>,
    ) -> String {
        let node = graph.node(id);
        if !node.kind.is_enumerable() {
            return Formatter::new(self.settings).format_at(graph, id, ancestors);
        }
        if ancestors.contains(&id) {
            tracing::trace!(node = id.index(), "cycle while rendering sequence");
            return CYCLE_PLACEHOLDER.to_string();
        }
        ancestors.push(id);
        let text = match &node.kind {
            Kind::Sequence(items) => {
                let view = View::compute(items.len(), highlight, window);
                let item = |i: usize, anc: &mut Vec<NodeId>| self.item(graph, items[i], anc);
                self.render_flat(items.len(), view, item, ancestors)
            }
            Kind::Map(pairs) => {
                let view = View::compute(pairs.len(), highlight, window);
                self.render_flat(
                    pairs.len(),
                    view,
                    |i, anc| {
                        let (k, v) = pairs[i];
                        format!("[{}, {}]", self.item(graph, k, anc), self.item(graph, v, anc))
                    },
                    ancestors,
                )
            }
            Kind::Grid { dims, items } => {
                let view = View::compute(items.len(), highlight, window);
                self.render_grid(graph, dims, items, 0, view, ancestors)
                    .unwrap_or_else(|| "{}".to_string())
            }
            _ => String::new(),
        };
        ancestors.pop();
        text
    }

    fn item(&self, graph: &Graph, id: NodeId, ancestors: &mut Vec<NodeId>) -> String {
        Formatter::new(self.settings).format_at(graph, id, ancestors)
    }

    fn render_flat(
        &self,
        len: usize,
        view: View,
        mut item: impl FnMut(usize, &mut Vec<NodeId>) -> String,
        ancestors: &mut Vec<NodeId>,
    ) -> String {
        let mut parts = Vec::with_capacity(view.last - view.first + 2);
        if view.first > 0 {
            parts.push(ELLIPSIS.to_string());
        }
        for i in view.first..view.last {
            let text = item(i, ancestors);
            parts.push(emphasize(text, view.highlight == Some(i)));
        }
        if view.last < len {
            parts.push(ELLIPSIS.to_string());
        }
        format!("{{{}}}", parts.join(","))
    }

    /// Render one block of a grid; `None` when no item of it is visible
    fn render_grid(
        &self,
        graph: &Graph,
        dims: &[usize],
        items: &[NodeId],
        offset: usize,
        view: View,
        ancestors: &mut Vec<NodeId>,
    ) -> Option<String> {
        let (&size, inner) = dims.split_first()?;
        let stride: usize = inner.iter().product();
        let mut parts = Vec::new();
        let mut visible = false;
        let mut elided = false;
        for i in 0..size {
            let block = if inner.is_empty() {
                let flat = offset + i;
                view.contains(flat).then(|| {
                    let text = self.item(graph, items[flat], ancestors);
                    emphasize(text, view.highlight == Some(flat))
                })
            } else {
                self.render_grid(graph, inner, items, offset + i * stride, view, ancestors)
            };
            match block {
                Some(text) => {
                    parts.push(text);
                    visible = true;
                    elided = false;
                }
                None if !elided => {
                    parts.push(ELLIPSIS.to_string());
                    elided = true;
                }
                None => {}
            }
        }
        visible.then(|| format!("{{{}}}", parts.join(",")))
    }
}

fn emphasize(text: String, highlighted: bool) -> String {
    if highlighted {
        format!("*{text}*")
    } else {
        text
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::inspect::{Capture, Grid, Inspect, Snapshot};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn render<V: Inspect + ?Sized>(
        value: &V,
        highlight: Option<usize>,
        window: Option<usize>,
    ) -> String {
        let settings = Settings::default();
        let snap = Snapshot::of(value);
        EnumerableRenderer::new(&settings).render(&snap.graph, snap.root, highlight, window)
    }

    fn render_counted<V: Inspect + ?Sized>(
        value: &V,
        highlight: Option<usize>,
        window: Option<usize>,
    ) -> String {
        let settings = Settings::default();
        let snap = Snapshot::of(value);
        EnumerableRenderer::new(&settings).render_with_count(
            &snap.graph,
            snap.root,
            highlight,
            window,
        )
    }

    mod windowing {
        use super::*;

        #[test]
        fn test_window_around_highlight() {
            let values: Vec<u32> = (0..53).collect();
            let out = render_counted(&values, Some(15), Some(20));
            assert!(out.starts_with("{...,5,"));
            assert!(out.contains(",24,...}"));
            assert_eq!(out.matches('*').count(), 2);
            assert!(out.contains("*15*"));
            assert!(out.ends_with("(53 items)"));
        }

        #[test]
        fn test_window_shifts_left_at_end() {
            let values: Vec<u32> = (0..10).collect();
            let out = render(&values, Some(9), Some(4));
            assert_eq!(out, "{...,6,7,8,*9*}");
        }

        #[test]
        fn test_window_at_start_has_no_leading_ellipsis() {
            let values: Vec<u32> = (0..10).collect();
            let out = render(&values, Some(0), Some(3));
            assert_eq!(out, "{*0*,1,2,...}");
        }

        #[test]
        fn test_highlight_beyond_length_is_clamped() {
            let out = render(&vec![1, 2, 3], Some(99), Some(2));
            assert_eq!(out, "{...,2,*3*}");
        }

        #[test]
        fn test_no_window_shows_everything() {
            let out = render(&vec![1, 2, 3], Some(1), None);
            assert_eq!(out, "{1,*2*,3}");
            assert_eq!(render(&vec![1, 2, 3], Some(1), Some(0)), "{1,*2*,3}");
        }

        #[test]
        fn test_single_item_in_view_not_highlighted() {
            assert_eq!(render(&vec![7], Some(0), None), "{7}");
            let values: Vec<u32> = (0..5).collect();
            assert_eq!(render(&values, Some(2), Some(1)), "{...,2,...}");
        }
    }

    mod counts {
        use super::*;

        #[test]
        fn test_empty_sequence() {
            assert_eq!(render(&Vec::<u8>::new(), None, None), "{}");
            assert_eq!(render_counted(&Vec::<u8>::new(), None, None), "{} (0 item)");
        }

        #[test]
        fn test_singular_and_plural() {
            assert_eq!(count_suffix(1), "(1 item)");
            assert_eq!(count_suffix(2), "(2 items)");
        }

        #[test]
        fn test_non_enumerable_has_no_suffix() {
            assert_eq!(render_counted(&5, None, None), "5");
        }
    }

    mod nesting {
        use super::*;

        #[test]
        fn test_nested_sequences() {
            assert_eq!(render(&vec![vec![1], vec![2, 3]], None, None), "{{1},{2,3}}");
        }

        #[test]
        fn test_grid_window_on_flat_index() {
            let grid = Grid::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9]]).unwrap();
            assert_eq!(render(&grid, Some(4), Some(3)), "{...,{4,*5*,6},...}");
            assert_eq!(render(&grid, Some(4), Some(4)), "{{...,3},{4,*5*,6},...}");
        }

        #[test]
        fn test_grid_highlight_without_window() {
            let grid = Grid::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
            assert_eq!(render(&grid, Some(3), None), "{{1,2},{3,*4*}}");
        }

        struct Looped(RefCell<Vec<Rc<Looped>>>);

        impl Inspect for Looped {
            fn inspect(&self, capture: &mut Capture) -> NodeId {
                self.0.inspect(capture)
            }
        }

        #[test]
        fn test_list_containing_itself_terminates() {
            let list = Rc::new(Looped(RefCell::new(Vec::new())));
            list.0.borrow_mut().push(Rc::clone(&list));
            assert_eq!(render(&list, None, None), "{{...}}");
            assert_eq!(render_counted(&list, None, None), "{{...}} (1 item)");
            list.0.borrow_mut().clear();
        }

        #[test]
        fn test_empty_grid() {
            let grid: Grid<u8> = Grid::new(vec![0, 3], Vec::new()).unwrap();
            assert_eq!(render(&grid, None, None), "{}");
        }
    }
}

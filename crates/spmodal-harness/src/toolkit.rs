#![forbid(unsafe_code)]

//! In-memory element tree.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use spmodal_core::{BindingId, ElementId, ElementSpec, TextAlign, Toolkit};
use tracing::trace;

/// One element of the headless tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub spec: ElementSpec,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
    pub attached: bool,
    pub visible: bool,
    pub z_index: Option<u32>,
    pub position: (Option<i32>, Option<i32>),
}

struct Binding {
    element: ElementId,
    event: String,
    callback: Rc<dyn Fn()>,
}

#[derive(Default)]
struct TreeState {
    next_element: u64,
    next_binding: u64,
    nodes: BTreeMap<ElementId, Node>,
    bindings: BTreeMap<BindingId, Binding>,
    focused: Option<ElementId>,
}

impl TreeState {
    fn collect_subtree(&self, root: ElementId, out: &mut Vec<ElementId>) {
        out.push(root);
        if let Some(node) = self.nodes.get(&root) {
            for child in &node.children {
                self.collect_subtree(*child, out);
            }
        }
    }
}

/// Toolkit that keeps elements in memory.
#[derive(Default)]
pub struct HeadlessToolkit {
    state: RefCell<TreeState>,
}

impl HeadlessToolkit {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    // --- Queries ---

    #[must_use]
    pub fn node(&self, element: ElementId) -> Option<Node> {
        self.state.borrow().nodes.get(&element).cloned()
    }

    #[must_use]
    pub fn exists(&self, element: ElementId) -> bool {
        self.state.borrow().nodes.contains_key(&element)
    }

    /// Live elements, attached or not.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.state.borrow().nodes.len()
    }

    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.state.borrow().bindings.len()
    }

    /// Exists, attached, and not hidden.
    #[must_use]
    pub fn is_visible(&self, element: ElementId) -> bool {
        self.state
            .borrow()
            .nodes
            .get(&element)
            .is_some_and(|node| node.attached && node.visible)
    }

    #[must_use]
    pub fn focused(&self) -> Option<ElementId> {
        self.state.borrow().focused
    }

    #[must_use]
    pub fn z_index_of(&self, element: ElementId) -> Option<u32> {
        self.state
            .borrow()
            .nodes
            .get(&element)
            .and_then(|node| node.z_index)
    }

    #[must_use]
    pub fn position_of(&self, element: ElementId) -> (Option<i32>, Option<i32>) {
        self.state
            .borrow()
            .nodes
            .get(&element)
            .map_or((None, None), |node| node.position)
    }

    /// Dialog containers, oldest first.
    #[must_use]
    pub fn dialogs(&self) -> Vec<ElementId> {
        self.matching(|spec| matches!(spec, ElementSpec::Dialog))
    }

    /// Frame elements, oldest first.
    #[must_use]
    pub fn frames(&self) -> Vec<ElementId> {
        self.matching(|spec| matches!(spec, ElementSpec::Frame { .. }))
    }

    #[must_use]
    pub fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.state
            .borrow()
            .nodes
            .get(&element)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn title_of(&self, dialog: ElementId) -> Option<String> {
        self.child_specs(dialog).into_iter().find_map(|spec| match spec {
            ElementSpec::Title { text } => Some(text),
            _ => None,
        })
    }

    /// `(content, html, align)` of the dialog body.
    #[must_use]
    pub fn body_of(&self, dialog: ElementId) -> Option<(String, bool, TextAlign)> {
        self.child_specs(dialog).into_iter().find_map(|spec| match spec {
            ElementSpec::Body {
                content,
                html,
                align,
            } => Some((content, html, align)),
            _ => None,
        })
    }

    #[must_use]
    pub fn has_spinner(&self, dialog: ElementId) -> bool {
        self.child_specs(dialog)
            .iter()
            .any(|spec| matches!(spec, ElementSpec::Spinner))
    }

    /// Button elements of a dialog in display order.
    #[must_use]
    pub fn buttons(&self, dialog: ElementId) -> Vec<ElementId> {
        let state = self.state.borrow();
        state
            .nodes
            .get(&dialog)
            .map(|node| {
                node.children
                    .iter()
                    .copied()
                    .filter(|child| {
                        state
                            .nodes
                            .get(child)
                            .is_some_and(|n| matches!(n.spec, ElementSpec::Button { .. }))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn button_labels(&self, dialog: ElementId) -> Vec<String> {
        self.child_specs(dialog)
            .into_iter()
            .filter_map(|spec| match spec {
                ElementSpec::Button { label } => Some(label),
                _ => None,
            })
            .collect()
    }

    // --- Input ---

    /// Fire the click bindings of `element`. Returns how many ran.
    pub fn click(&self, element: ElementId) -> usize {
        self.fire(element, "click")
    }

    /// Fire the bindings of `element` for `event`. Returns how many ran.
    pub fn fire(&self, element: ElementId, event: &str) -> usize {
        let callbacks: Vec<Rc<dyn Fn()>> = self
            .state
            .borrow()
            .bindings
            .values()
            .filter(|b| b.element == element && b.event == event)
            .map(|b| Rc::clone(&b.callback))
            .collect();
        trace!(element = element.id(), event, count = callbacks.len(), "firing bindings");
        for callback in &callbacks {
            callback();
        }
        callbacks.len()
    }

    fn matching(&self, pred: impl Fn(&ElementSpec) -> bool) -> Vec<ElementId> {
        self.state
            .borrow()
            .nodes
            .iter()
            .filter(|(_, node)| pred(&node.spec))
            .map(|(id, _)| *id)
            .collect()
    }

    fn child_specs(&self, element: ElementId) -> Vec<ElementSpec> {
        let state = self.state.borrow();
        state
            .nodes
            .get(&element)
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|child| state.nodes.get(child).map(|n| n.spec.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn with_node(&self, element: ElementId, f: impl FnOnce(&mut Node)) {
        if let Some(node) = self.state.borrow_mut().nodes.get_mut(&element) {
            f(node);
        }
    }
}

impl Toolkit for HeadlessToolkit {
    fn create(&self, spec: ElementSpec) -> ElementId {
        let mut state = self.state.borrow_mut();
        state.next_element += 1;
        let id = ElementId::from_raw(state.next_element);
        state.nodes.insert(
            id,
            Node {
                spec,
                parent: None,
                children: Vec::new(),
                attached: false,
                visible: true,
                z_index: None,
                position: (None, None),
            },
        );
        id
    }

    fn update(&self, element: ElementId, spec: ElementSpec) {
        self.with_node(element, |node| node.spec = spec);
    }

    fn attach(&self, element: ElementId, parent: Option<ElementId>) {
        let mut state = self.state.borrow_mut();
        if !state.nodes.contains_key(&element) {
            return;
        }
        if let Some(parent) = parent {
            let Some(parent_node) = state.nodes.get_mut(&parent) else {
                return;
            };
            if !parent_node.children.contains(&element) {
                parent_node.children.push(element);
            }
        }
        if let Some(node) = state.nodes.get_mut(&element) {
            node.parent = parent;
            node.attached = true;
        }
    }

    fn detach(&self, element: ElementId) {
        let mut state = self.state.borrow_mut();
        let Some(parent) = state.nodes.get(&element).map(|node| node.parent) else {
            return;
        };
        if let Some(parent) = parent.and_then(|p| state.nodes.get_mut(&p)) {
            parent.children.retain(|child| *child != element);
        }
        let mut doomed = Vec::new();
        state.collect_subtree(element, &mut doomed);
        for id in &doomed {
            state.nodes.remove(id);
        }
        state.bindings.retain(|_, b| !doomed.contains(&b.element));
        if state.focused.is_some_and(|f| doomed.contains(&f)) {
            state.focused = None;
        }
    }

    fn set_visible(&self, element: ElementId, visible: bool) {
        self.with_node(element, |node| node.visible = visible);
    }

    fn set_z_index(&self, element: ElementId, z_index: u32) {
        self.with_node(element, |node| node.z_index = Some(z_index));
    }

    fn set_position(&self, element: ElementId, x: Option<i32>, y: Option<i32>) {
        self.with_node(element, |node| node.position = (x, y));
    }

    fn focus(&self, element: ElementId) {
        let mut state = self.state.borrow_mut();
        if state.nodes.contains_key(&element) {
            state.focused = Some(element);
        }
    }

    fn blur(&self, element: ElementId) {
        let mut state = self.state.borrow_mut();
        if state.focused == Some(element) {
            state.focused = None;
        }
    }

    fn bind(&self, element: ElementId, event: &str, callback: Rc<dyn Fn()>) -> BindingId {
        let mut state = self.state.borrow_mut();
        state.next_binding += 1;
        let id = BindingId::from_raw(state.next_binding);
        state.bindings.insert(
            id,
            Binding {
                element,
                event: event.to_string(),
                callback,
            },
        );
        id
    }

    fn unbind(&self, binding: BindingId) {
        self.state.borrow_mut().bindings.remove(&binding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn detach_removes_subtree_and_bindings() {
        let tk = HeadlessToolkit::new();
        let root = tk.create(ElementSpec::Dialog);
        tk.attach(root, None);
        let button = tk.create(ElementSpec::Button { label: "Ok".into() });
        tk.attach(button, Some(root));
        tk.bind(button, "click", Rc::new(|| {}));
        tk.focus(button);

        tk.detach(root);
        assert_eq!(tk.element_count(), 0);
        assert_eq!(tk.binding_count(), 0);
        assert_eq!(tk.focused(), None);
    }

    #[test]
    fn click_runs_bound_callbacks() {
        let tk = HeadlessToolkit::new();
        let button = tk.create(ElementSpec::Button { label: "Go".into() });
        let hits = Rc::new(Cell::new(0));
        let binding = {
            let hits = Rc::clone(&hits);
            tk.bind(button, "click", Rc::new(move || hits.set(hits.get() + 1)))
        };
        assert_eq!(tk.click(button), 1);
        tk.unbind(binding);
        assert_eq!(tk.click(button), 0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn unattached_elements_are_not_visible() {
        let tk = HeadlessToolkit::new();
        let el = tk.create(ElementSpec::Backdrop);
        assert!(!tk.is_visible(el));
        tk.attach(el, None);
        assert!(tk.is_visible(el));
        tk.set_visible(el, false);
        assert!(!tk.is_visible(el));
    }

    #[test]
    fn queries_read_dialog_children() {
        let tk = HeadlessToolkit::new();
        let root = tk.create(ElementSpec::Dialog);
        for spec in [
            ElementSpec::Title { text: "T".into() },
            ElementSpec::Body {
                content: "B".into(),
                html: false,
                align: TextAlign::Right,
            },
            ElementSpec::Button { label: "Ok".into() },
        ] {
            let child = tk.create(spec);
            tk.attach(child, Some(root));
        }
        assert_eq!(tk.title_of(root).as_deref(), Some("T"));
        assert_eq!(tk.body_of(root), Some(("B".into(), false, TextAlign::Right)));
        assert_eq!(tk.button_labels(root), vec!["Ok"]);
        assert_eq!(tk.buttons(root).len(), 1);
        assert_eq!(tk.dialogs(), vec![root]);
    }
}

//! One-shot synchronous renderer.
//!
//! Builds output nodes for a descriptor tree in a single recursive pass,
//! with no fibers, no diffing, and no yielding. Each node is fully built
//! (props applied, children attached) before being appended to its parent,
//! so the container sees one complete subtree arrive.
//!
//! This is the right tool for static output - reports, snapshots, one-off
//! dumps. Anything that re-renders belongs on a
//! [`RenderEngine`](super::RenderEngine), which reuses nodes instead of
//! rebuilding the world.

use crate::element::{Element, ElementKind};
use crate::target::{OutputHandle, OutputTarget};
use crate::types::{EngineError, NodeKind, Props};

use super::commit::apply_props;

/// Render `element` into `container`, depth-first, all at once.
pub fn render_sync<T: OutputTarget>(
    target: &mut T,
    element: &Element,
    container: OutputHandle,
) -> Result<(), EngineError> {
    match &element.kind {
        ElementKind::Component { render, .. } => {
            let rendered = render(&element.props);
            render_sync(target, &rendered, container)
        }
        ElementKind::Text => {
            let handle = target.create_node(NodeKind::Text, "");
            apply_props(target, handle, &Props::new(), &element.props);
            target.append_child(container, handle);
            Ok(())
        }
        ElementKind::Host { tag } => {
            if tag.is_empty() {
                return Err(EngineError::EmptyTag);
            }
            let handle = target.create_node(NodeKind::Element, tag);
            apply_props(target, handle, &Props::new(), &element.props);
            for child in &element.children {
                render_sync(target, child, handle)?;
            }
            target.append_child(container, handle);
            Ok(())
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{component, element, text};
    use crate::props;
    use crate::target::{MemoryTree, RecordingTarget, TargetOp};

    #[test]
    fn test_renders_full_tree() {
        let mut target = MemoryTree::new();
        let container = target.create_root();

        let tree = element(
            "div",
            props! { "id" => "app" },
            vec![element("span", props! {}, vec![text("hi")])],
        );
        render_sync(&mut target, &tree, container).unwrap();

        assert_eq!(target.node_count(), 4); // container, div, span, text
        let div = target.children(container)[0];
        assert_eq!(target.tag(div), Some("div"));
    }

    #[test]
    fn test_children_attach_before_parent() {
        let mut target = RecordingTarget::new();
        let container = target.create_root();

        let tree = element("div", props! {}, vec![text("a")]);
        render_sync(&mut target, &tree, container).unwrap();

        // The text is appended to the div before the div reaches the
        // container.
        let appends = target.appends();
        assert_eq!(appends.len(), 2);
        assert_eq!(appends[1].0, container);
        assert_eq!(appends[0].0, appends[1].1);
    }

    #[test]
    fn test_component_renders_its_output() {
        fn greeting(_props: &crate::types::Props) -> Element {
            element("h1", props! {}, vec![text("hello")])
        }

        let mut target = RecordingTarget::new();
        let container = target.create_root();
        render_sync(&mut target, &component(greeting, props! {}), container).unwrap();

        assert_eq!(target.created_tags(), vec!["h1".to_string(), String::new()]);
    }

    #[test]
    fn test_event_props_subscribe() {
        let mut target = RecordingTarget::new();
        let container = target.create_root();

        let handler: crate::types::EventCallback = std::rc::Rc::new(|_| {});
        let tree = element("button", props! { "onClick" => handler }, vec![]);
        render_sync(&mut target, &tree, container).unwrap();

        assert_eq!(
            target.count(
                |op| matches!(op, TargetOp::Subscribe { event, .. } if event == "click")
            ),
            1
        );
    }

    #[test]
    fn test_empty_tag_errors_without_attaching() {
        let mut target = RecordingTarget::new();
        let container = target.create_root();

        let tree = element("", props! {}, vec![]);
        assert_eq!(
            render_sync(&mut target, &tree, container),
            Err(EngineError::EmptyTag)
        );
        assert!(target.appends().is_empty());
    }
}

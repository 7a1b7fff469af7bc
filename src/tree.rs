//! Layer-tree traversal: flattening, placeholder lookup, name listing.
//!
//! All walks are iterative over an explicit stack of slice iterators, so a
//! deeply nested document cannot overflow the call stack. Document trees
//! are acyclic by construction (children are owned), but nesting deeper
//! than [`MAX_DEPTH`] is not descended into.

use crate::document::Layer;
use tracing::{debug, warn};

/// Deepest group nesting that is traversed.
pub const MAX_DEPTH: usize = 64;

/// How many layer names a not-found report carries.
pub const AVAILABLE_NAMES_LIMIT: usize = 20;

/// A layer in paint order, with the context the flat list loses.
#[derive(Debug, Clone, Copy)]
pub struct FlatLayer<'a> {
    pub layer: &'a Layer,
    /// 0 for root layers.
    pub depth: usize,
    /// False if the layer or any enclosing group is hidden.
    pub visible: bool,
}

struct Frame<'a> {
    iter: std::slice::Iter<'a, Layer>,
    visible: bool,
}

/// Flatten the tree into paint order: each layer, then its children in place.
///
/// Hidden layers are kept (indices must match what a group-aware renderer
/// would use); their hiddenness is reported through [`FlatLayer::visible`].
pub fn flatten(roots: &[Layer]) -> Vec<FlatLayer<'_>> {
    let mut out = Vec::new();
    let mut stack = vec![Frame {
        iter: roots.iter(),
        visible: true,
    }];

    loop {
        let Some(frame) = stack.last_mut() else {
            break;
        };
        let inherited = frame.visible;
        let Some(layer) = frame.iter.next() else {
            stack.pop();
            continue;
        };

        let depth = stack.len() - 1;
        let visible = inherited && !layer.hidden;
        out.push(FlatLayer {
            layer,
            depth,
            visible,
        });

        if layer.is_group() {
            if depth >= MAX_DEPTH {
                warn!(
                    layer = layer.display_name(),
                    depth, "group nesting too deep; children skipped"
                );
            } else {
                stack.push(Frame {
                    iter: layer.children.iter(),
                    visible,
                });
            }
        }
    }

    out
}

/// Trimmed, lowercased form used for name matching.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Find the placeholder layer: the first visible layer in depth-first tree
/// order whose normalized name equals any normalized candidate.
///
/// Hidden layers, and everything inside a hidden group, are never matched.
/// A name match wins even without the smart-object marker.
pub fn locate<'a>(roots: &'a [Layer], candidates: &[String]) -> Option<&'a Layer> {
    let wanted: Vec<String> = candidates.iter().map(|c| normalize_name(c)).collect();
    let mut stack = vec![roots.iter()];

    while let Some(iter) = stack.last_mut() {
        let Some(layer) = iter.next() else {
            stack.pop();
            continue;
        };
        if layer.hidden {
            continue;
        }

        let name = normalize_name(layer.name.as_deref().unwrap_or(""));
        if wanted.iter().any(|w| *w == name) {
            debug!(
                layer = layer.display_name(),
                smart_object = layer.placed,
                "placeholder layer matched by name"
            );
            return Some(layer);
        }

        if layer.is_group() && stack.len() <= MAX_DEPTH {
            stack.push(layer.children.iter());
        }
    }

    None
}

/// Index of `target` (by identity) in a flattened list.
pub fn position_of(flat: &[FlatLayer<'_>], target: &Layer) -> Option<usize> {
    flat.iter().position(|f| std::ptr::eq(f.layer, target))
}

/// Names of all layers in paint order, hidden ones included, up to `limit`.
pub fn layer_names(roots: &[Layer], limit: usize) -> Vec<String> {
    flatten(roots)
        .into_iter()
        .filter_map(|f| f.layer.name.as_deref())
        .filter(|n| !n.is_empty())
        .take(limit)
        .map(str::to_string)
        .collect()
}

use crate::ir::NodeId;

/// Width every premise of a conclusion is given: an even share of the
/// conclusion's width, never below `floor`. `None` without premises.
pub fn share_width(conclusion_width: f32, premises: usize, floor: f32) -> Option<f32> {
    if premises == 0 {
        return None;
    }
    let share = conclusion_width.max(0.0) / premises as f32;
    Some(share.max(floor))
}

/// Last committed width-sharing pass for one conclusion.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct WidthCommit {
    /// Conclusion width in local units at commit time.
    pub width: f32,
    pub share: f32,
    pub premises: Vec<NodeId>,
}

/// Hysteresis guard. A new pass is committed when nothing was committed yet,
/// when the premise row changed, or when the width moved by more than
/// `tolerance`. Smaller moves are layout noise.
pub(super) fn should_commit(
    previous: Option<&WidthCommit>,
    width: f32,
    premises: &[NodeId],
    tolerance: f32,
) -> bool {
    match previous {
        None => true,
        Some(commit) => {
            commit.premises.as_slice() != premises || (width - commit.width).abs() > tolerance
        }
    }
}

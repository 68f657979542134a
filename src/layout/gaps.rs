use crate::foundation::core::Role;

/// Decide, per image, whether a gap band goes directly above it.
///
/// A band marks the return from a subtitle-only run to a new keyframe. Nothing is inserted when
/// gaps are disabled or when fewer than two keyframes exist, and never above the first image.
pub fn plan_gaps(roles: &[Role], enable_gap: bool) -> Vec<bool> {
    let keyframes = roles.iter().filter(|r| r.is_keyframe()).count();
    if !enable_gap || keyframes < 2 {
        return vec![false; roles.len()];
    }

    roles
        .iter()
        .enumerate()
        .map(|(i, role)| i > 0 && roles[i - 1] == Role::SubtitleOnly && *role == Role::Keyframe)
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/layout/gaps.rs"]
mod tests;

use meshview_common::DrawMode;

/// A high-level viewer action produced from key input.
///
/// The frame renderer consumes actions, never raw key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Flip the light between on and off.
    ToggleLight,
    /// Select a specific primitive topology.
    SetDrawMode(DrawMode),
    /// Advance to the next primitive topology.
    CycleDrawMode,
    /// Key with no binding.
    Noop,
}

/// Default key map. Letters are case-insensitive.
pub fn action_for_key(key: char) -> Action {
    match key.to_ascii_lowercase() {
        'l' => Action::ToggleLight,
        'm' => Action::CycleDrawMode,
        '1' => Action::SetDrawMode(DrawMode::Filled),
        '2' => Action::SetDrawMode(DrawMode::Wireframe),
        '3' => Action::SetDrawMode(DrawMode::Points),
        _ => Action::Noop,
    }
}

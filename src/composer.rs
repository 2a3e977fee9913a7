//! Reading composer: pure-function assembly of the spoken description for a
//! node's batch snapshot (§4.F). Grounded on
//! `original_source/accessibility/internal/service/screen-reader/reading-composer.cpp`'s
//! `composeRoleTrait`/`composeStateTrait`/`composeDescriptionTrait`/`compose`.

use crate::model::ReadingMaterial;
use crate::role::Role;
use crate::state::State;

/// Parameters the composer is varied by: a plain screen-reader profile uses
/// the defaults; the TV profile (§4.H) sets both.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposerConfig {
    pub suppress_touch_hints: bool,
    pub include_tv_traits: bool,
}

/// Fixed English phrase per role (§4.F trait 2). A separate table from
/// [`Role::name`]: the composer's phrases are capitalized short forms meant
/// to read naturally mid-sentence, `Role::name` is the lowercase
/// wire/default-label string. Roles with no entry contribute nothing.
fn role_trait(role: Role) -> &'static str {
    use Role::*;
    match role {
        PushButton => "Button",
        CheckBox => "Check box",
        RadioButton => "Radio button",
        ToggleButton => "Toggle button",
        Slider => "Slider",
        ProgressBar => "Progress bar",
        SpinButton => "Spin button",
        Entry => "Edit field",
        PasswordText => "Password field",
        Label => "Label",
        List | ListBox => "List",
        ListItem => "List item",
        Menu => "Menu",
        MenuItem | CheckMenuItem | RadioMenuItem | TearoffMenuItem => "Menu item",
        MenuBar => "Menu bar",
        PageTab => "Tab",
        PageTabList => "Tab bar",
        ComboBox => "Combo box",
        Dialog => "Dialog",
        Alert => "Alert",
        PopupMenu => "Popup menu",
        ToolTip => "Tooltip",
        ToolBar => "Toolbar",
        StatusBar => "Status bar",
        Table | TreeTable => "Table",
        TableCell => "Table cell",
        Tree => "Tree",
        TreeItem => "Tree item",
        ScrollBar => "Scroll bar",
        Separator => "Separator",
        Heading => "Heading",
        Link => "Link",
        Image => "Image",
        Icon => "Icon",
        Notification => "Notification",
        Window => "Window",
        Panel => "Panel",
        _ => "",
    }
}

/// Name trait (§4.F 1): first non-empty of labeled-by-name, name, text.
fn name_trait(rm: &ReadingMaterial) -> &str {
    if !rm.labeled_by_name.is_empty() {
        &rm.labeled_by_name
    } else if !rm.name.is_empty() {
        &rm.name
    } else {
        &rm.text_interface_name
    }
}

/// State trait (§4.F 3): every applicable fragment, joined with ", ".
fn state_trait(rm: &ReadingMaterial) -> String {
    let mut parts = Vec::new();
    if rm.states.contains(State::Checkable) {
        parts.push(if rm.states.contains(State::Checked) { "Checked" } else { "Not checked" });
    }
    if rm.states.contains(State::Selected) {
        parts.push("Selected");
    }
    if rm.states.contains(State::Expandable) {
        parts.push(if rm.states.contains(State::Expanded) { "Expanded" } else { "Collapsed" });
    }
    if !rm.states.contains(State::Enabled) {
        parts.push("Disabled");
    }
    if rm.states.contains(State::ReadOnly) && rm.states.contains(State::Editable) {
        parts.push("Read only");
    }
    if rm.states.contains(State::Required) {
        parts.push("Required");
    }
    parts.join(", ")
}

/// Description trait (§4.F 4): TV-specific prefixes, value/description
/// fields, joined with ", ". Touch/navigation hints are kept separate from
/// this trait since they read as their own sentence, not a comma fragment.
fn description_trait(rm: &ReadingMaterial, config: ComposerConfig) -> String {
    let mut parts: Vec<String> = Vec::new();

    if config.include_tv_traits {
        if rm.role == Role::PopupMenu && rm.child_count > 0 {
            parts.push(format!("{} items", rm.child_count));
        }
        if rm.role == Role::ProgressBar {
            parts.push(format!("{}%", rm.current_value.floor() as i64));
        }
    }

    if rm.role == Role::Slider {
        if !rm.formatted_value.is_empty() {
            parts.push(rm.formatted_value.clone());
        } else {
            parts.push(format!("{}", rm.current_value.floor() as i64));
        }
    }

    if !rm.description.is_empty() {
        parts.push(rm.description.clone());
    }

    parts.join(", ")
}

/// Hint sentences appended after everything else, unless suppressed (the TV
/// profile suppresses these since its remote has no touch surface).
fn hint_trait(rm: &ReadingMaterial, config: ComposerConfig) -> Vec<&'static str> {
    let mut hints = Vec::new();
    if config.suppress_touch_hints {
        return hints;
    }
    if rm.role.is_activatable() {
        hints.push("Double tap to activate");
    }
    if rm.role == Role::Slider {
        hints.push("Swipe up or down to adjust");
    }
    hints
}

/// Assembles the spoken description for one node's batch snapshot: name,
/// role trait, state trait and description trait are joined with ", ";
/// hint sentences are appended last, separated by ". " so they read as
/// their own sentence rather than a comma fragment (§4.F, §8 scenario 1).
pub fn compose(rm: &ReadingMaterial, config: ComposerConfig) -> String {
    let segments = [
        name_trait(rm).to_string(),
        role_trait(rm.role).to_string(),
        state_trait(rm),
        description_trait(rm, config),
    ];
    let main = segments.into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(", ");

    let hints = hint_trait(rm, config);
    if hints.is_empty() {
        return main;
    }
    let hints = hints.join(". ");
    if main.is_empty() {
        hints
    } else {
        format!("{main}. {hints}")
    }
}

// Window front-end - the loader's Surface and the page renderers on the Slint window
//
// Mapping onto MainWindow:
// - mount point: the page area, present while the event loop bridge is alive
// - style slot: the PageStyle global (page name + accent colour)
// - markup: the page component switch, plus the title and help text
// - renderers: the QuickFindModel and CleanserModel globals

use crate::models::{
    CleanPhase, CleanserChange, CleanserState, QuickFindChange, QuickFindState, Summary, Theme, Tone,
};
use crate::ui::bridge::EventLoopBridgeHandle;
use crate::ui::controller::{CleanserModel, CleanserRow, Colors, MainWindow, PageStyle, QuickFindModel};
use crate::ui::loader::{StyleHandle, Surface};
use crate::ui::session::{FrontEnd, PageRenderer};
use slint::{Color, ComponentHandle, ModelRc, SharedString, VecModel};

/// Accent used while no page style is attached
const NEUTRAL_ACCENT: (u8, u8, u8) = (0x80, 0x86, 0x8b);

/// Accent colour of a page style
pub fn accent_for(locator: &str) -> (u8, u8, u8) {
    match locator {
        "quick-find" => (0x3d, 0x8b, 0xd6),
        "project-cleanser" => (0xd0, 0x7a, 0x2b),
        _ => NEUTRAL_ACCENT,
    }
}

/// Name of the page component shown for `route`
pub fn page_component(route: &str) -> &str {
    route.trim_start_matches('/')
}

/// Split page markup into its `# Title` line and the help text below it.
pub fn split_markup(markup: &str) -> (String, String) {
    let mut lines = markup.lines();
    let title = match lines.next() {
        Some(first) if first.starts_with('#') => first.trim_start_matches('#').trim().to_string(),
        Some(first) => return (String::new(), markup_help(std::iter::once(first).chain(lines))),
        None => return (String::new(), String::new()),
    };
    (title, markup_help(lines))
}

fn markup_help<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    lines
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Tone as the `.slint` side encodes it
pub fn tone_index(tone: Tone) -> i32 {
    match tone {
        Tone::Neutral => 0,
        Tone::Success => 1,
        Tone::Error => 2,
    }
}

/// Rows of the cleanser list with their checkbox state
pub fn cleanser_rows(state: &CleanserState) -> Vec<CleanserRow> {
    state
        .rows
        .iter()
        .map(|row| CleanserRow {
            path: row.path.as_str().into(),
            occupied: row.occupied.as_str().into(),
            category: row.category.as_str().into(),
            updated_at: row.updated_at.as_str().into(),
            selected: state.selected.contains(&row.path),
        })
        .collect()
}

/// The value to write into a text field bound to user input, if any.
///
/// Input the user just typed comes back as an echo; writing it again would
/// fight the caret, so only real differences are written.
pub fn text_update(current: &str, wanted: &str) -> Option<SharedString> {
    if current.trim() == wanted.trim() {
        None
    } else {
        Some(wanted.into())
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::from_rgb_u8(r, g, b)
}

/// The loader's [`Surface`] on the main window.
pub struct WindowSurface {
    ui: EventLoopBridgeHandle<MainWindow>,
    next_handle: u64,
    styles: Vec<(StyleHandle, String)>,
}

impl WindowSurface {
    pub fn new(ui: EventLoopBridgeHandle<MainWindow>) -> Self {
        Self {
            ui,
            next_handle: 0,
            styles: Vec::new(),
        }
    }

    fn apply_page_style(&self) {
        let (name, accent) = match self.styles.last() {
            Some((_, locator)) => (locator.clone(), accent_for(locator)),
            None => (String::new(), NEUTRAL_ACCENT),
        };
        self.ui.update_ui(move |ui| {
            let style = ui.global::<PageStyle>();
            style.set_name(name.into());
            style.set_accent(rgb(accent));
        });
    }
}

impl Surface for WindowSurface {
    fn has_mount_point(&self) -> bool {
        self.ui.is_connected()
    }

    fn attach_style(&mut self, locator: &str) -> StyleHandle {
        self.next_handle += 1;
        let handle = StyleHandle(self.next_handle);
        self.styles.push((handle, locator.to_string()));
        self.apply_page_style();
        tracing::debug!("Attached page style {}", locator);
        handle
    }

    fn detach_style(&mut self, handle: StyleHandle) {
        self.styles.retain(|(h, _)| *h != handle);
        self.apply_page_style();
    }

    fn replace_markup(&mut self, route: &str, markup: &str) {
        let page = page_component(route).to_string();
        let (title, help) = split_markup(markup);
        self.ui.update_ui(move |ui| {
            ui.set_page(page.into());
            ui.set_page_title(title.into());
            ui.set_page_help(help.into());
        });
    }

    fn highlight_nav(&mut self, route: &str) {
        let route = route.to_string();
        self.ui.update_ui(move |ui| ui.set_active_route(route.into()));
    }
}

impl FrontEnd for WindowSurface {
    type Renderer = WindowRenderer;

    fn renderer(&self) -> WindowRenderer {
        WindowRenderer { ui: self.ui.clone() }
    }

    fn apply_theme(&mut self, theme: Theme) {
        let dark = theme == Theme::Dark;
        self.ui.update_ui(move |ui| ui.global::<Colors>().set_dark(dark));
        tracing::debug!("Applied {} theme", theme.as_str());
    }

    fn notify(&mut self, notice: &Summary) {
        let text = notice.text.clone();
        let tone = tone_index(notice.tone);
        self.ui.update_ui(move |ui| {
            ui.set_notice(text.into());
            ui.set_notice_tone(tone);
        });
    }
}

/// Writes page changes into the page model globals.
#[derive(Clone)]
pub struct WindowRenderer {
    ui: EventLoopBridgeHandle<MainWindow>,
}

impl PageRenderer for WindowRenderer {
    fn quick_find(&self, change: &QuickFindChange, state: &QuickFindState) {
        match change {
            QuickFindChange::InputsChanged { root_path, pattern } => {
                let (root_path, pattern) = (root_path.clone(), pattern.clone());
                self.ui.update_ui(move |ui| {
                    let model = ui.global::<QuickFindModel>();
                    if let Some(text) = text_update(&model.get_root_path(), &root_path) {
                        model.set_root_path(text);
                    }
                    if let Some(text) = text_update(&model.get_pattern(), &pattern) {
                        model.set_pattern(text);
                    }
                });
            }
            QuickFindChange::ResultsChanged { note, .. } => {
                let matches: Vec<SharedString> = state.matches.iter().map(|m| m.as_str().into()).collect();
                let note = note.clone().unwrap_or_default();
                self.ui.update_ui(move |ui| {
                    let model = ui.global::<QuickFindModel>();
                    model.set_matches(ModelRc::new(VecModel::from(matches)));
                    model.set_note(note.into());
                });
            }
            QuickFindChange::SummaryChanged(summary) => {
                let text = summary.text.clone();
                let tone = tone_index(summary.tone);
                self.ui.update_ui(move |ui| {
                    let model = ui.global::<QuickFindModel>();
                    model.set_summary(text.into());
                    model.set_summary_tone(tone);
                });
            }
            QuickFindChange::ControlsChanged(controls) => {
                let controls = controls.clone();
                self.ui.update_ui(move |ui| {
                    let model = ui.global::<QuickFindModel>();
                    model.set_search_enabled(controls.search_enabled);
                    model.set_reset_enabled(controls.reset_enabled);
                });
            }
        }
    }

    fn cleanser(&self, change: &CleanserChange, state: &CleanserState) {
        match change {
            CleanserChange::InputsChanged {
                root_path,
                project_type,
            } => {
                let root_path = root_path.clone();
                let project_type = project_type.as_str();
                self.ui.update_ui(move |ui| {
                    let model = ui.global::<CleanserModel>();
                    if let Some(text) = text_update(&model.get_root_path(), &root_path) {
                        model.set_root_path(text);
                    }
                    model.set_project_type(project_type.into());
                });
            }
            CleanserChange::RowsChanged { .. } => self.set_rows(state),
            CleanserChange::SelectionChanged { summary, .. } => {
                self.set_rows(state);
                let summary = summary.clone();
                self.ui
                    .update_ui(move |ui| ui.global::<CleanserModel>().set_selection_summary(summary.into()));
            }
            CleanserChange::SummaryChanged(summary) => {
                let text = summary.text.clone();
                let tone = tone_index(summary.tone);
                self.ui.update_ui(move |ui| {
                    let model = ui.global::<CleanserModel>();
                    model.set_summary(text.into());
                    model.set_summary_tone(tone);
                });
            }
            CleanserChange::ControlsChanged(controls) => {
                let controls = controls.clone();
                self.ui.update_ui(move |ui| {
                    let model = ui.global::<CleanserModel>();
                    model.set_scan_enabled(controls.scan_enabled);
                    model.set_reset_enabled(controls.reset_enabled);
                    model.set_clean_enabled(controls.clean_enabled);
                    model.set_clean_label(controls.clean_label.into());
                    model.set_select_all_checked(controls.select_all_checked);
                });
            }
            CleanserChange::ConfirmationOpened { message } => {
                let message = message.clone();
                self.ui.update_ui(move |ui| {
                    let model = ui.global::<CleanserModel>();
                    model.set_dialog_message(message.into());
                    model.set_dialog_open(true);
                });
            }
            CleanserChange::ConfirmationClosed => {
                self.ui
                    .update_ui(|ui| ui.global::<CleanserModel>().set_dialog_open(false));
            }
            CleanserChange::PhaseChanged { clean, .. } => {
                let selectable = *clean != CleanPhase::Cleaning;
                self.ui
                    .update_ui(move |ui| ui.global::<CleanserModel>().set_selection_enabled(selectable));
            }
        }
    }
}

impl WindowRenderer {
    fn set_rows(&self, state: &CleanserState) {
        let rows = cleanser_rows(state);
        self.ui.update_ui(move |ui| {
            ui.global::<CleanserModel>()
                .set_rows(ModelRc::new(VecModel::from(rows)));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RowRecord;

    #[test]
    fn test_split_markup_title_and_help() {
        let (title, help) = split_markup("# Quick find\nSearch a tree.\n  Use ** across directories.\n");
        assert_eq!(title, "Quick find");
        assert_eq!(help, "Search a tree.\nUse ** across directories.");
    }

    #[test]
    fn test_split_markup_without_title() {
        assert_eq!(split_markup("Just help"), (String::new(), "Just help".to_string()));
        assert_eq!(split_markup(""), (String::new(), String::new()));
    }

    #[test]
    fn test_page_component_for_route() {
        assert_eq!(page_component("/quick-find"), "quick-find");
        assert_eq!(page_component("/project-cleanser"), "project-cleanser");
    }

    #[test]
    fn test_accent_per_page_style() {
        assert_ne!(accent_for("quick-find"), accent_for("project-cleanser"));
        assert_eq!(accent_for("unknown"), NEUTRAL_ACCENT);
    }

    #[test]
    fn test_tone_encoding_matches_slint_side() {
        assert_eq!(tone_index(Tone::Neutral), 0);
        assert_eq!(tone_index(Tone::Success), 1);
        assert_eq!(tone_index(Tone::Error), 2);
    }

    #[test]
    fn test_text_update_skips_echoes() {
        assert_eq!(text_update("/tmp/proj ", "/tmp/proj"), None);
        assert_eq!(text_update("/tmp/proj", ""), Some(SharedString::from("")));
    }

    #[test]
    fn test_cleanser_rows_carry_selection() {
        let mut state = CleanserState::default();
        state.replace_rows(vec![
            RowRecord {
                path: "/a/target".to_string(),
                occupied: "1 KB".to_string(),
                category: "Cargo".to_string(),
                updated_at: "2025-07-20".to_string(),
                total_bytes: 1024,
            },
            RowRecord {
                path: "/b/target".to_string(),
                occupied: "2 KB".to_string(),
                category: "Maven".to_string(),
                updated_at: "2023-02-11".to_string(),
                total_bytes: 2048,
            },
        ]);
        state.selected.insert("/b/target".to_string());

        let rows = cleanser_rows(&state);

        assert_eq!(rows.len(), 2);
        assert!(!rows[0].selected);
        assert!(rows[1].selected);
        assert_eq!(rows[1].updated_at, "2023-02-11");
    }
}

use serde::{Deserialize, Serialize};

/// Closed enumeration of categorical UI roles (§3). Serialized as a small
/// unsigned integer; each variant has a fixed lowercase English name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Role {
    Invalid = 0,
    AcceleratorLabel,
    Alert,
    Animation,
    Arrow,
    Calendar,
    Canvas,
    CheckBox,
    CheckMenuItem,
    ColorChooser,
    ColumnHeader,
    ComboBox,
    DateEditor,
    DesktopIcon,
    DesktopFrame,
    Dial,
    Dialog,
    DirectoryPane,
    DrawingArea,
    FileChooser,
    Filler,
    FocusTraversable,
    FontChooser,
    Frame,
    GlassPane,
    HtmlContainer,
    Icon,
    Image,
    InternalFrame,
    Label,
    LayeredPane,
    List,
    ListItem,
    Menu,
    MenuBar,
    MenuItem,
    OptionPane,
    PageTab,
    PageTabList,
    Panel,
    PasswordText,
    PopupMenu,
    ProgressBar,
    PushButton,
    RadioButton,
    RadioMenuItem,
    RootPane,
    RowHeader,
    ScrollBar,
    ScrollPane,
    Separator,
    Slider,
    SpinButton,
    SplitPane,
    StatusBar,
    Table,
    TableCell,
    TableColumnHeader,
    TableRowHeader,
    TearoffMenuItem,
    Terminal,
    Text,
    ToggleButton,
    ToolBar,
    ToolTip,
    Tree,
    TreeTable,
    Unknown,
    Viewport,
    Window,
    Extended,
    Header,
    Footer,
    Paragraph,
    Ruler,
    Application,
    Autocomplete,
    Editbar,
    Embedded,
    Entry,
    Chart,
    Caption,
    DocumentFrame,
    Heading,
    Page,
    Section,
    RedundantObject,
    Form,
    Link,
    InputMethodWindow,
    TableRow,
    TreeItem,
    DocumentSpreadsheet,
    DocumentPresentation,
    DocumentText,
    DocumentWeb,
    DocumentEmail,
    Comment,
    ListBox,
    Grouping,
    ImageMap,
    Notification,
    InfoBar,
    LevelBar,
    TitleBar,
    BlockQuote,
    Audio,
    Video,
    Definition,
    Article,
    Landmark,
    Log,
    Marquee,
    Math,
    Rating,
    Timer,
    Static,
    MathFraction,
    MathRoot,
    Subscript,
    Superscript,
    DescriptionList,
    DescriptionTerm,
    DescriptionValue,
    Footnote,
    ContentDeletion,
    ContentInsertion,
    Mark,
    Suggestion,
    PushButtonMenu,
}

impl Default for Role {
    fn default() -> Self {
        Role::Invalid
    }
}

/// Every variant in declaration order; the index equals each variant's
/// (automatically assigned, sequential-from-`Invalid = 0`) discriminant, so
/// this doubles as the inverse of `as u8` (§3: "serialized as a small
/// unsigned integer").
const ALL_ROLES: &[Role] = &{
    use Role::*;
    [
        Invalid, AcceleratorLabel, Alert, Animation, Arrow, Calendar, Canvas, CheckBox, CheckMenuItem,
        ColorChooser, ColumnHeader, ComboBox, DateEditor, DesktopIcon, DesktopFrame, Dial, Dialog,
        DirectoryPane, DrawingArea, FileChooser, Filler, FocusTraversable, FontChooser, Frame, GlassPane,
        HtmlContainer, Icon, Image, InternalFrame, Label, LayeredPane, List, ListItem, Menu, MenuBar,
        MenuItem, OptionPane, PageTab, PageTabList, Panel, PasswordText, PopupMenu, ProgressBar,
        PushButton, RadioButton, RadioMenuItem, RootPane, RowHeader, ScrollBar, ScrollPane, Separator,
        Slider, SpinButton, SplitPane, StatusBar, Table, TableCell, TableColumnHeader, TableRowHeader,
        TearoffMenuItem, Terminal, Text, ToggleButton, ToolBar, ToolTip, Tree, TreeTable, Unknown,
        Viewport, Window, Extended, Header, Footer, Paragraph, Ruler, Application, Autocomplete, Editbar,
        Embedded, Entry, Chart, Caption, DocumentFrame, Heading, Page, Section, RedundantObject, Form,
        Link, InputMethodWindow, TableRow, TreeItem, DocumentSpreadsheet, DocumentPresentation,
        DocumentText, DocumentWeb, DocumentEmail, Comment, ListBox, Grouping, ImageMap, Notification,
        InfoBar, LevelBar, TitleBar, BlockQuote, Audio, Video, Definition, Article, Landmark, Log,
        Marquee, Math, Rating, Timer, Static, MathFraction, MathRoot, Subscript, Superscript,
        DescriptionList, DescriptionTerm, DescriptionValue, Footnote, ContentDeletion, ContentInsertion,
        Mark, Suggestion, PushButtonMenu,
    ]
};

impl Role {
    /// Inverse of `role as u8`; `None` for a value outside the closed
    /// enumeration (wire decode of an out-of-range byte).
    pub fn from_u8(value: u8) -> Option<Role> {
        ALL_ROLES.get(value as usize).copied()
    }

    /// Fixed lowercase English name used as the default role string (§3). Total
    /// over the closed enumeration, so never empty (§8 invariant).
    pub fn name(self) -> &'static str {
        use Role::*;
        match self {
            Invalid => "invalid",
            AcceleratorLabel => "accelerator label",
            Alert => "alert",
            Animation => "animation",
            Arrow => "arrow",
            Calendar => "calendar",
            Canvas => "canvas",
            CheckBox => "check box",
            CheckMenuItem => "check menu item",
            ColorChooser => "color chooser",
            ColumnHeader => "column header",
            ComboBox => "combo box",
            DateEditor => "date editor",
            DesktopIcon => "desktop icon",
            DesktopFrame => "desktop frame",
            Dial => "dial",
            Dialog => "dialog",
            DirectoryPane => "directory pane",
            DrawingArea => "drawing area",
            FileChooser => "file chooser",
            Filler => "filler",
            FocusTraversable => "focus traversable",
            FontChooser => "font chooser",
            Frame => "frame",
            GlassPane => "glass pane",
            HtmlContainer => "html container",
            Icon => "icon",
            Image => "image",
            InternalFrame => "internal frame",
            Label => "label",
            LayeredPane => "layered pane",
            List => "list",
            ListItem => "list item",
            Menu => "menu",
            MenuBar => "menu bar",
            MenuItem => "menu item",
            OptionPane => "option pane",
            PageTab => "page tab",
            PageTabList => "page tab list",
            Panel => "panel",
            PasswordText => "password text",
            PopupMenu => "popup menu",
            ProgressBar => "progress bar",
            PushButton => "push button",
            RadioButton => "radio button",
            RadioMenuItem => "radio menu item",
            RootPane => "root pane",
            RowHeader => "row header",
            ScrollBar => "scroll bar",
            ScrollPane => "scroll pane",
            Separator => "separator",
            Slider => "slider",
            SpinButton => "spin button",
            SplitPane => "split pane",
            StatusBar => "status bar",
            Table => "table",
            TableCell => "table cell",
            TableColumnHeader => "table column header",
            TableRowHeader => "table row header",
            TearoffMenuItem => "tearoff menu item",
            Terminal => "terminal",
            Text => "text",
            ToggleButton => "toggle button",
            ToolBar => "tool bar",
            ToolTip => "tool tip",
            Tree => "tree",
            TreeTable => "tree table",
            Unknown => "unknown",
            Viewport => "viewport",
            Window => "window",
            Extended => "extended",
            Header => "header",
            Footer => "footer",
            Paragraph => "paragraph",
            Ruler => "ruler",
            Application => "application",
            Autocomplete => "autocomplete",
            Editbar => "edit bar",
            Embedded => "embedded",
            Entry => "entry",
            Chart => "chart",
            Caption => "caption",
            DocumentFrame => "document frame",
            Heading => "heading",
            Page => "page",
            Section => "section",
            RedundantObject => "redundant object",
            Form => "form",
            Link => "link",
            InputMethodWindow => "input method window",
            TableRow => "table row",
            TreeItem => "tree item",
            DocumentSpreadsheet => "document spreadsheet",
            DocumentPresentation => "document presentation",
            DocumentText => "document text",
            DocumentWeb => "document web",
            DocumentEmail => "document email",
            Comment => "comment",
            ListBox => "list box",
            Grouping => "grouping",
            ImageMap => "image map",
            Notification => "notification",
            InfoBar => "info bar",
            LevelBar => "level bar",
            TitleBar => "title bar",
            BlockQuote => "block quote",
            Audio => "audio",
            Video => "video",
            Definition => "definition",
            Article => "article",
            Landmark => "landmark",
            Log => "log",
            Marquee => "marquee",
            Math => "math",
            Rating => "rating",
            Timer => "timer",
            Static => "static",
            MathFraction => "math fraction",
            MathRoot => "math root",
            Subscript => "subscript",
            Superscript => "superscript",
            DescriptionList => "description list",
            DescriptionTerm => "description term",
            DescriptionValue => "description value",
            Footnote => "footnote",
            ContentDeletion => "content deletion",
            ContentInsertion => "content insertion",
            Mark => "mark",
            Suggestion => "suggestion",
            PushButtonMenu => "push button menu",
        }
    }

    /// Roles the reading composer treats as "activatable" (§4.F trait 4).
    pub fn is_activatable(self) -> bool {
        matches!(
            self,
            Role::PushButton
                | Role::CheckBox
                | Role::RadioButton
                | Role::ToggleButton
                | Role::Link
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_name_is_total() {
        assert_eq!(Role::Invalid.name(), "invalid");
        assert_eq!(Role::PushButton.name(), "push button");
        assert_eq!(Role::PushButtonMenu.name(), "push button menu");
        assert_eq!(Role::Slider.name(), "slider");
    }

    #[test]
    fn activatable_roles_match_composer_table() {
        assert!(Role::PushButton.is_activatable());
        assert!(Role::Link.is_activatable());
        assert!(!Role::Label.is_activatable());
    }

    #[test]
    fn from_u8_is_inverse_of_as_u8() {
        for role in [Role::Invalid, Role::PushButton, Role::Slider, Role::PushButtonMenu] {
            assert_eq!(Role::from_u8(role as u8), Some(role));
        }
        assert_eq!(Role::from_u8(255), None);
    }
}

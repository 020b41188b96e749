//! Dialog catalogs of the dashboard screens

use super::dialogs::DialogKind;
use serde::{Deserialize, Serialize};

/// Screens with a dialog-driven table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Users,
    Sections,
    Announcements,
    Reporting,
    Settings,
}

impl Screen {
    /// Names of the screen's dialogs
    pub fn dialog_names(&self) -> Vec<&'static str> {
        match self {
            Self::Users => names::<UserDialog>(),
            Self::Sections => names::<SectionDialog>(),
            Self::Announcements => names::<AnnouncementDialog>(),
            Self::Reporting => names::<ReportingDialog>(),
            Self::Settings => names::<SettingsDialog>(),
        }
    }
}

fn names<K: DialogKind>() -> Vec<&'static str> {
    K::ALL.iter().map(DialogKind::name).collect()
}

/// User management dialogs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDialog {
    AddUser,
    PasswordChange,
    PasswordReset,
    BlockUser,
    DeleteUser,
}

impl DialogKind for UserDialog {
    const ALL: &'static [Self] = &[
        Self::AddUser,
        Self::PasswordChange,
        Self::PasswordReset,
        Self::BlockUser,
        Self::DeleteUser,
    ];

    fn name(&self) -> &'static str {
        match self {
            Self::AddUser => "addUser",
            Self::PasswordChange => "passwordChange",
            Self::PasswordReset => "passwordReset",
            Self::BlockUser => "blockUser",
            Self::DeleteUser => "deleteUser",
        }
    }
}

/// Content section dialogs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionDialog {
    AddSection,
    ViewSection,
    EditSection,
    DeleteSection,
    AiPreview,
}

impl DialogKind for SectionDialog {
    const ALL: &'static [Self] = &[
        Self::AddSection,
        Self::ViewSection,
        Self::EditSection,
        Self::DeleteSection,
        Self::AiPreview,
    ];

    fn name(&self) -> &'static str {
        match self {
            Self::AddSection => "addSection",
            Self::ViewSection => "viewSection",
            Self::EditSection => "editSection",
            Self::DeleteSection => "deleteSection",
            Self::AiPreview => "aiPreview",
        }
    }
}

/// "What's new" announcement dialogs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnouncementDialog {
    CreatePost,
    EditPost,
    DeletePost,
}

impl DialogKind for AnnouncementDialog {
    const ALL: &'static [Self] = &[Self::CreatePost, Self::EditPost, Self::DeletePost];

    fn name(&self) -> &'static str {
        match self {
            Self::CreatePost => "createPost",
            Self::EditPost => "editPost",
            Self::DeletePost => "deletePost",
        }
    }
}

/// Reporting dialogs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportingDialog {
    ExportPdf,
}

impl DialogKind for ReportingDialog {
    const ALL: &'static [Self] = &[Self::ExportPdf];

    fn name(&self) -> &'static str {
        match self {
            Self::ExportPdf => "exportPdf",
        }
    }
}

/// Settings forms save in place and only report back through success
/// notifications, so the screen declares no dialogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsDialog {}

impl DialogKind for SettingsDialog {
    const ALL: &'static [Self] = &[];

    fn name(&self) -> &'static str {
        match *self {}
    }
}

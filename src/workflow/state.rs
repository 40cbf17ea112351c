use crate::rosbag::UploadForm;

/// Where the current upload action stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPhase {
    #[default]
    Idle,
    LocallyValidating,
    ServerValidating {
        files: usize,
    },
    Uploading {
        files: usize,
    },
}

impl UploadPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, UploadPhase::Idle)
    }

    pub fn status_text(&self) -> String {
        match self {
            UploadPhase::Idle => String::new(),
            UploadPhase::LocallyValidating => String::from("Checking selected files..."),
            UploadPhase::ServerValidating { files } => {
                format!("Validating {} file(s) with the server...", files)
            }
            UploadPhase::Uploading { files } => format!("Uploading {} file(s)...", files),
        }
    }
}

/// Files that passed the extension check. Only local validation creates one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocallyValidated {
    form: UploadForm,
}

impl LocallyValidated {
    pub(super) fn new(form: UploadForm) -> Self {
        Self { form }
    }

    pub fn form(&self) -> &UploadForm {
        &self.form
    }

    pub(super) fn accept(self) -> ServerValidated {
        ServerValidated { form: self.form }
    }
}

/// Files the server accepted. Only server validation creates one, and an
/// upload cannot be dispatched without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerValidated {
    form: UploadForm,
}

impl ServerValidated {
    pub fn form(&self) -> &UploadForm {
        &self.form
    }

    pub(super) fn into_form(self) -> UploadForm {
        self.form
    }
}

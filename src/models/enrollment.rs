use serde::{Deserialize, Serialize};

/// Remote collection polled for enrollment requests.
pub const ENROLL_DIR: &str = "/fingerprint/register";
/// The single request node inside `ENROLL_DIR`.
pub const ENROLL_PATH: &str = "/fingerprint/register/request";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Pending,
    Success,
    Failed,
}

/// Request to store a new fingerprint template in a sensor slot, issued by
/// the back office and completed on the device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrollmentRequest {
    pub id: u32,
    pub name: String,
    pub status: EnrollmentStatus,
}

impl EnrollmentRequest {
    pub fn pending(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            status: EnrollmentStatus::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == EnrollmentStatus::Pending
    }

    pub fn completed(&self, ok: bool) -> Self {
        Self {
            status: if ok {
                EnrollmentStatus::Success
            } else {
                EnrollmentStatus::Failed
            },
            ..self.clone()
        }
    }
}

pub mod fcm_client;
pub mod messaging_models;
pub mod messenger;
pub mod service_account;

pub use fcm_client::FcmClient;
pub use messaging_models::{BatchResponse, MulticastMessage, PushNotification, SendError, SendResponse};
pub use messenger::{Messenger, MessagingError};

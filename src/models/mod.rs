pub mod comment;
pub mod emotion;
pub mod emotionable;
pub mod post;
pub mod user;

pub use comment::{Entity as Comment, Model as CommentModel};
pub use emotion::{Entity as Emotion, Model as EmotionModel};
pub use emotionable::{Entity as Emotionable, Model as EmotionableModel, TargetKind};
pub use post::{Entity as Post, Model as PostModel};
pub use user::{Entity as User, Model as UserModel};

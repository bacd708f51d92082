// Wiki entities: pages and their authors

pub mod ent_page;
pub mod ent_user;

pub use ent_page::{EntPage, EntPageBuilder, PageStatus};
pub use ent_user::{EntUser, EntUserBuilder};

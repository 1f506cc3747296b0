//! Collaborators shared by every page of the running app.

use std::rc::Rc;

use crate::config::AppConfig;
use crate::history::{MemorySearchRepository, SearchRepository};
use crate::query::{RelationshipSource, StaticRelationships};

pub struct Services {
	pub config: AppConfig,
	pub source: Box<dyn RelationshipSource>,
	pub repo: Box<dyn SearchRepository>,
}

impl Services {
	/// Sample mailboxes and an in-memory history.
	fn demo() -> Self {
		Self {
			config: AppConfig::default(),
			source: Box::new(
				StaticRelationships::sample("enron", 48).with_sample("small-office", 12),
			),
			repo: Box::new(MemorySearchRepository::new()),
		}
	}
}

thread_local! {
	static SERVICES: Rc<Services> = Rc::new(Services::demo());
}

pub fn services() -> Rc<Services> {
	SERVICES.with(Rc::clone)
}

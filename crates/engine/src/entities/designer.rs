//! Designer entity operations.

use std::sync::Arc;

use roomcraft_domain::{self as domain, DesignerFilter, DesignerId};

use crate::infrastructure::ports::{DesignerRepo, RepoError};

pub struct Designer {
    repo: Arc<dyn DesignerRepo>,
}

impl Designer {
    pub fn new(repo: Arc<dyn DesignerRepo>) -> Self {
        Self { repo }
    }

    pub async fn get(&self, id: DesignerId) -> Result<Option<domain::Designer>, RepoError> {
        self.repo.get_designer(id).await
    }

    pub async fn search(&self, filter: &DesignerFilter) -> Result<Vec<domain::Designer>, RepoError> {
        self.repo.search_designers(filter).await
    }

    pub async fn save(&self, designer: &domain::Designer) -> Result<(), RepoError> {
        self.repo.save_designer(designer).await
    }
}

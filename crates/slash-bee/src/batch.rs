use crate::bee::Bee;
use crate::error::BeeResult;
use crate::node::Block;

/// Mutations buffered for one atomic commit.
///
/// Nothing is visible until [`Batch::flush`]; then every mutation lands in
/// a single log append, so readers observe all of them or none.
#[must_use = "a batch does nothing until flushed"]
pub struct Batch {
    bee: Bee,
    blocks: Vec<Block>,
}

impl Batch {
    pub(crate) fn new(bee: Bee) -> Self {
        Self {
            bee,
            blocks: Vec::new(),
        }
    }

    /// Queue an insert or replace.
    pub fn put(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> &mut Self {
        self.blocks.push(Block::Entry {
            key: self.bee.full_key(key.as_ref()),
            value: Some(value.as_ref().to_vec()),
        });
        self
    }

    /// Queue a deletion.
    pub fn del(&mut self, key: impl AsRef<[u8]>) -> &mut Self {
        self.blocks.push(Block::Entry {
            key: self.bee.full_key(key.as_ref()),
            value: None,
        });
        self
    }

    /// Number of queued mutations.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Commit every queued mutation in one append.
    pub async fn flush(self) -> BeeResult<()> {
        if self.blocks.is_empty() {
            return Ok(());
        }
        self.bee.commit(self.blocks).await
    }
}

#[cfg(test)]
mod tests {
    use slash_core::{CoreOptions, Corestore};

    use crate::Bee;

    #[tokio::test]
    async fn empty_flush_writes_nothing() {
        let bee = Bee::new(Corestore::new().get(CoreOptions::named("bee")).unwrap());
        let batch = bee.batch();
        assert!(batch.is_empty());
        batch.flush().await.unwrap();
        assert_eq!(bee.version(), 0);
    }

    #[tokio::test]
    async fn unflushed_batch_is_invisible() {
        let bee = Bee::new(Corestore::new().get(CoreOptions::named("bee")).unwrap());
        let mut batch = bee.batch();
        batch.put("a", "1").put("b", "2");
        assert_eq!(batch.len(), 2);
        assert!(bee.get("a").await.unwrap().is_none());

        batch.flush().await.unwrap();
        assert!(bee.get("a").await.unwrap().is_some());
        assert!(bee.get("b").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn batch_through_sub_prefixes_keys() {
        let bee = Bee::new(Corestore::new().get(CoreOptions::named("bee")).unwrap());
        let sub = bee.sub("h");
        let mut batch = sub.batch();
        batch.put("c", "key").put("v", "1.0.0");
        batch.flush().await.unwrap();

        assert!(sub.get("c").await.unwrap().is_some());
        assert!(bee.get("c").await.unwrap().is_none());
        assert!(bee.get(b"h\0c").await.unwrap().is_some());
    }
}

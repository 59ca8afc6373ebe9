use redb::TableDefinition;

// Every table is a set: the uniqueness tuple is the key.

/// (path, file_hash, declared_size)
pub const FILES: TableDefinition<(&str, u64, u64), ()> = TableDefinition::new("files");

/// (blob_hash, size) -> chunk bytes
pub const BLOBS: TableDefinition<(u64, u32), &[u8]> = TableDefinition::new("blobs");

/// (file_hash, ordinal, blob_hash); ordinal second so a range scan yields chunk order
pub const FILE_BLOBS: TableDefinition<(u64, u32, u64), ()> = TableDefinition::new("file_blobs");

/// (file_hash, tag_key, tag_val)
pub const FILE_TAGS: TableDefinition<(u64, &str, &str), ()> = TableDefinition::new("file_tags");

/// (tag_key, tag_val, file_hash), reverse index of FILE_TAGS
pub const TAG_FILES: TableDefinition<(&str, &str, u64), ()> = TableDefinition::new("tag_files");

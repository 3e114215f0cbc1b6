//! Operations shared by the `object_store`-backed implementations.

use crate::traits::{StorageError, StorageResult, StoredObject};
use bytes::Bytes;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};

pub(crate) fn location(key: &str) -> StorageResult<Path> {
    if key.is_empty() || key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(Path::from(key.to_string()))
}

pub(crate) async fn put_with_content_type<S: ObjectStore>(
    store: &S,
    location: &Path,
    data: Bytes,
    content_type: &str,
) -> ObjectResult<()> {
    let mut attributes = Attributes::new();
    attributes.insert(Attribute::ContentType, content_type.to_string().into());

    let options = PutOptions {
        attributes,
        ..Default::default()
    };

    store
        .put_opts(location, PutPayload::from(data), options)
        .await
        .map(|_| ())
}

pub(crate) async fn get<S: ObjectStore>(store: &S, key: &str) -> StorageResult<StoredObject> {
    let location = location(key)?;
    let result = store.get(&location).await.map_err(|e| match e {
        ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
        other => StorageError::DownloadFailed(other.to_string()),
    })?;

    let content_type = result
        .attributes
        .get(&Attribute::ContentType)
        .map(|value| value.as_ref().to_string());
    let data = result
        .bytes()
        .await
        .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

    Ok(StoredObject { data, content_type })
}

pub(crate) async fn exists<S: ObjectStore>(store: &S, key: &str) -> StorageResult<bool> {
    let location = location(key)?;
    match store.head(&location).await {
        Ok(_) => Ok(true),
        Err(ObjectStoreError::NotFound { .. }) => Ok(false),
        Err(e) => Err(StorageError::BackendError(e.to_string())),
    }
}

pub(crate) async fn delete<S: ObjectStore>(store: &S, key: &str) -> StorageResult<()> {
    let location = location(key)?;
    store
        .delete(&location)
        .await
        .map_err(|e| StorageError::DeleteFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_rejects_traversal() {
        assert!(location("landscape/abc.mp4").is_ok());
        assert!(location("").is_err());
        assert!(location("/etc/passwd").is_err());
        assert!(location("thumbnails/../../secret").is_err());
    }
}

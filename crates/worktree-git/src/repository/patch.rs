use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::types::ApplyOptions;

use super::Repository;

impl Repository {
    /// Applies a patch file to the working tree, or to the index when `options.cached` is set.
    ///
    /// Nothing is written if any hunk fails to apply.
    ///
    /// # Errors
    ///
    /// Returns an error if `git apply` rejects the patch.
    pub async fn apply_patch(
        &self,
        patch: &Path,
        options: ApplyOptions,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut command = self.command().arg("apply");
        if options.cached {
            command = command.arg("--cached");
        }
        if options.reverse {
            command = command.arg("--reverse");
        }
        command.arg("--").arg(patch).run(self.root(), cancel).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{commit_file, setup_test_repo};
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    const PATCH: &str = "\
diff --git a/a.txt b/a.txt
--- a/a.txt
+++ b/a.txt
@@ -1 +1,2 @@
 hello
+world
";

    fn write_patch(dir: &tempfile::TempDir) -> anyhow::Result<PathBuf> {
        let path = dir.path().join("change.patch");
        fs::write(&path, PATCH)?;
        Ok(path)
    }

    #[tokio::test]
    async fn apply_then_reverse_restores_file() -> anyhow::Result<()> {
        let (dir, repo) = setup_test_repo()?;
        let cancel = CancellationToken::new();
        commit_file(&dir, &repo, "a.txt", "hello\n").await?;
        let scratch = tempfile::TempDir::new()?;
        let patch = write_patch(&scratch)?;

        repo.apply_patch(&patch, ApplyOptions::default(), &cancel)
            .await?;
        assert_eq!(fs::read_to_string(dir.path().join("a.txt"))?, "hello\nworld\n");

        let reverse = ApplyOptions::default().reversed();
        repo.apply_patch(&patch, reverse, &cancel).await?;
        assert_eq!(fs::read_to_string(dir.path().join("a.txt"))?, "hello\n");
        Ok(())
    }

    #[tokio::test]
    async fn cached_apply_only_touches_index() -> anyhow::Result<()> {
        let (dir, repo) = setup_test_repo()?;
        let cancel = CancellationToken::new();
        commit_file(&dir, &repo, "a.txt", "hello\n").await?;
        let scratch = tempfile::TempDir::new()?;
        let patch = write_patch(&scratch)?;

        let options = ApplyOptions {
            cached: true,
            reverse: false,
        };
        repo.apply_patch(&patch, options, &cancel).await?;

        assert_eq!(fs::read_to_string(dir.path().join("a.txt"))?, "hello\n");
        assert_eq!(
            repo.staged_files(&cancel).await?,
            vec![PathBuf::from("a.txt")]
        );
        Ok(())
    }

    #[tokio::test]
    async fn mismatched_patch_is_rejected() -> anyhow::Result<()> {
        let (dir, repo) = setup_test_repo()?;
        let cancel = CancellationToken::new();
        commit_file(&dir, &repo, "a.txt", "something else\n").await?;
        let scratch = tempfile::TempDir::new()?;
        let patch = write_patch(&scratch)?;

        let result = repo
            .apply_patch(&patch, ApplyOptions::default(), &cancel)
            .await;

        assert!(result.is_err());
        assert_eq!(
            fs::read_to_string(dir.path().join("a.txt"))?,
            "something else\n"
        );
        Ok(())
    }
}

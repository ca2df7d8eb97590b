//! Integration tests for assetmill

mod pipeline_tests {
    use assetmill::config::{CacheBackend, Config, ConfigManager};
    use assetmill::{
        merge, Capabilities, Capability, Content, FileHunk, Filter, FilterChain, FilterOptions,
        FilterTool, Hunk, MemoryCache, MemoryHunk, MillError, MillResult, TransformKind,
    };
    use std::fs;
    use std::io::{Read, Write};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Strips whitespace
    #[derive(Default)]
    struct Minify {
        runs: AtomicUsize,
    }

    impl Filter for Minify {
        fn name(&self) -> &str {
            "minify"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::NONE.with(Capability::Output)
        }

        fn output(
            &self,
            input: &mut dyn Read,
            out: &mut dyn Write,
            _options: &FilterOptions,
        ) -> MillResult<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            let mut s = String::new();
            input
                .read_to_string(&mut s)
                .map_err(|e| MillError::filter("minify", e))?;
            let minified: String = s.chars().filter(|c| !c.is_whitespace()).collect();
            out.write_all(minified.as_bytes())
                .map_err(|e| MillError::filter("minify", e))
        }
    }

    /// Same identity as `Minify` but unable to run
    struct UnavailableMinify;

    impl Filter for UnavailableMinify {
        fn name(&self) -> &str {
            "minify"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::NONE.with(Capability::Output)
        }

        fn output(
            &self,
            _input: &mut dyn Read,
            _out: &mut dyn Write,
            _options: &FilterOptions,
        ) -> MillResult<()> {
            Err(MillError::filter("minify", "executable not installed"))
        }
    }

    fn text(s: &str) -> Arc<dyn Hunk> {
        Arc::new(MemoryHunk::new(s))
    }

    #[test]
    fn cached_result_survives_unavailable_filter() {
        let tool = FilterTool::new(Some(Arc::new(MemoryCache::new())));

        let working = FilterChain::new().with(Arc::new(Minify::default()));
        let first = tool
            .apply(text("a{color:red}"), &working, TransformKind::Output, None)
            .unwrap();

        let broken = FilterChain::new().with(Arc::new(UnavailableMinify));
        let second = tool
            .apply(text("a{color:red}"), &broken, TransformKind::Output, None)
            .unwrap();

        assert_eq!(first.data().unwrap(), Content::from("a{color:red}"));
        assert_eq!(first.data().unwrap(), second.data().unwrap());
    }

    #[test]
    fn file_and_memory_hunks_share_cache_entries() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("site.css");
        fs::write(&path, "h1 { margin: 0 }").unwrap();

        let minify = Arc::new(Minify::default());
        let chain = FilterChain::new().with(minify.clone());
        let tool = FilterTool::new(Some(Arc::new(MemoryCache::new())));

        let from_file = tool
            .apply(Arc::new(FileHunk::new(&path)), &chain, TransformKind::Output, None)
            .unwrap();
        let from_memory = tool
            .apply(text("h1 { margin: 0 }"), &chain, TransformKind::Output, None)
            .unwrap();

        assert_eq!(from_file.data().unwrap(), Content::from("h1{margin:0}"));
        assert_eq!(from_file.data().unwrap(), from_memory.data().unwrap());
        assert_eq!(minify.runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn source_change_invalidates_result() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.css");
        fs::write(&path, "a { }").unwrap();

        let minify = Arc::new(Minify::default());
        let chain = FilterChain::new().with(minify.clone());
        let tool = FilterTool::new(Some(Arc::new(MemoryCache::new())));
        let hunk: Arc<dyn Hunk> = Arc::new(FileHunk::new(&path));

        tool.apply(hunk.clone(), &chain, TransformKind::Output, None)
            .unwrap();
        fs::write(&path, "b { }").unwrap();
        let result = tool
            .apply(hunk, &chain, TransformKind::Output, None)
            .unwrap();

        assert_eq!(result.data().unwrap(), Content::from("b{}"));
        assert_eq!(minify.runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn merge_then_filter() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.js");
        let b = temp.path().join("b.js");
        fs::write(&a, "var a = 1; // trailing").unwrap();
        fs::write(&b, "var b = 2;").unwrap();

        let first: Arc<dyn Hunk> = Arc::new(FileHunk::new(&a));
        let second: Arc<dyn Hunk> = Arc::new(FileHunk::new(&b));
        let merged = merge(&[first, second]).unwrap();
        assert_eq!(
            merged.data().unwrap(),
            Content::from("var a = 1; // trailing\nvar b = 2;")
        );
        assert_eq!(merged.files().len(), 2);

        let tool = FilterTool::new(None);
        let out = tool
            .apply(Arc::new(merged), &FilterChain::new(), TransformKind::Output, None)
            .unwrap();
        assert_eq!(
            out.data().unwrap(),
            Content::from("var a = 1; // trailing\nvar b = 2;")
        );
    }

    #[tokio::test]
    async fn filesystem_cache_persists_across_tools() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("config.toml"));

        let mut config = Config::default();
        config.cache.backend = CacheBackend::Filesystem;
        config.cache.directory = Some(temp.path().join("cache"));
        manager.save(&config).await.unwrap();

        let loaded = manager.load().await.unwrap();
        let working = FilterChain::new().with(Arc::new(Minify::default()));
        FilterTool::from_config(&loaded)
            .unwrap()
            .apply(text("p { }"), &working, TransformKind::Output, None)
            .unwrap();

        // A fresh tool stands in for a later build process
        let broken = FilterChain::new().with(Arc::new(UnavailableMinify));
        let result = FilterTool::from_config(&loaded)
            .unwrap()
            .apply(text("p { }"), &broken, TransformKind::Output, None)
            .unwrap();
        assert_eq!(result.data().unwrap(), Content::from("p{}"));
    }
}

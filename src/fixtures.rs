#[cfg(test)]
pub mod test {
    use std::fs;

    use tempfile::TempDir;

    /// A temp config directory holding `files` as `(name, content)` pairs.
    pub fn config_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    /// Current on-disk content of `name` inside `dir`.
    pub fn read(dir: &TempDir, name: &str) -> String {
        fs::read_to_string(dir.path().join(name)).unwrap()
    }

    /// A small project laid out like a real engine config directory.
    pub fn sample_project() -> TempDir {
        config_dir(&[
            (
                "DefaultEngine.ini",
                "[/Script/Engine.RendererSettings]\nr.DefaultFeature.AntiAliasing=2\nr.ShadowQuality=3\n\n[Core.Log]\nLogTemp=Warning\n",
            ),
            (
                "DefaultGame.ini",
                "; generated by the editor\n[/Script/EngineSettings.GeneralProjectSettings]\nProjectName=Sample\n",
            ),
            (
                "ProjectEngine.ini",
                "[/Script/Engine.RendererSettings]\nr.ShadowQuality=1\n",
            ),
            (
                "GameUserSettings.ini",
                "[ScalabilityGroups]\nsg.ResolutionQuality=100\n",
            ),
        ])
    }

    #[test]
    fn sample_project_has_one_duplicate() {
        let dir = sample_project();
        let mut db = crate::LayeredDb::new();
        db.load(dir.path()).unwrap();
        let dups = db.find_duplicates();
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].key, "r.shadowquality");
        assert_eq!(dups[0].files, vec!["DefaultEngine.ini", "ProjectEngine.ini"]);
    }
}

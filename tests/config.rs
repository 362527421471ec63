use betarat::{BetaRatio, Config, Hyp2F1Choice, Hyp2F1Method, PpfMethod, Prior};
use tempfile::tempdir;

#[test]
fn test_config_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("betarat.toml");

    let mut config = Config::default();
    config.prior = Prior::RARE;
    config.no_inverting = true;
    config.hyp2f1 = Hyp2F1Choice::Auto;
    config.ppf_method = PpfMethod::Optim;
    config.quant.h_init = 1e-4;
    config.quant.max_restarts = 2;
    config.cdf.maxiter = 30;
    config.optim.xtol = 1e-10;

    config.to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded, config);
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_missing_config_file() {
    let dir = tempdir().unwrap();
    assert!(Config::from_file(dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_from_config_applies_settings() {
    let mut config = Config::default();
    config.prior = Prior::NONE;
    config.hyp2f1 = Hyp2F1Choice::Auto;

    let br = BetaRatio::from_config(10.0, 5.0, 40.0, 45.0, &config).unwrap();
    assert!(br.is_inverted());
    assert_eq!((br.a1(), br.b1()), (10.0, 40.0));
    assert_eq!(br.hyp2f1_method(), Hyp2F1Method::RecursiveFactored);

    config.no_inverting = true;
    config.prior = Prior::JEFFREYS;
    let br = BetaRatio::from_config(10.0, 5.0, 40.0, 45.0, &config).unwrap();
    assert!(!br.is_inverted());
    assert_eq!(br.hyp2f1_method(), Hyp2F1Method::Series);

    config.hyp2f1 = Hyp2F1Choice::Factored;
    assert!(BetaRatio::from_config(10.0, 5.0, 40.0, 45.0, &config).is_err());
}

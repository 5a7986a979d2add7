//! Unit tests for reputation crate

#[cfg(test)]
mod ledger_tests {
    use crate::application::Ledger;
    use crate::application::config::ReputationConfig;
    use crate::domain::repository::MinerRepository;
    use crate::domain::value_object::MinerId;
    use crate::infra::memory::MemoryMinerRepository;
    use std::sync::Arc;

    fn ledger() -> (Ledger<MemoryMinerRepository>, Arc<MemoryMinerRepository>) {
        let repo = Arc::new(MemoryMinerRepository::new());
        let ledger = Ledger::new(repo.clone(), Arc::new(ReputationConfig::default()));
        (ledger, repo)
    }

    #[tokio::test]
    async fn test_credit_and_penalize_upsert() {
        let (ledger, repo) = ledger();
        let miner = MinerId::from("10.0.0.1");

        assert_eq!(ledger.penalize(&miner).await.unwrap(), -3);
        assert_eq!(ledger.credit(&miner).await.unwrap(), 2);
        assert_eq!(ledger.credit(&miner).await.unwrap(), 7);

        let stored = repo.find(&miner).await.unwrap().unwrap();
        assert_eq!(stored.score, 7);
        assert!(!stored.banned);
    }

    #[tokio::test]
    async fn test_unknown_identity_not_banned() {
        let (ledger, repo) = ledger();
        let miner = MinerId::from("10.0.0.2");

        assert!(!ledger.is_banned(&miner).await.unwrap());
        repo.set_banned(&miner, true);
        assert!(ledger.is_banned(&miner).await.unwrap());
        assert_eq!(repo.score(&miner), 0);
    }
}

#[cfg(test)]
mod name_tests {
    use crate::application::SetNameUseCase;
    use crate::application::config::ReputationConfig;
    use crate::domain::repository::MinerRepository;
    use crate::domain::value_object::MinerId;
    use crate::error::ReputationError;
    use crate::infra::memory::MemoryMinerRepository;
    use std::sync::Arc;

    fn use_case() -> (SetNameUseCase<MemoryMinerRepository>, Arc<MemoryMinerRepository>) {
        let repo = Arc::new(MemoryMinerRepository::new());
        let uc = SetNameUseCase::new(repo.clone(), Arc::new(ReputationConfig::default()));
        (uc, repo)
    }

    #[tokio::test]
    async fn test_missing_and_blank_name() {
        let (uc, _) = use_case();
        let miner = MinerId::from("10.0.0.1");

        assert!(matches!(
            uc.execute(&miner, None).await,
            Err(ReputationError::NameMissing)
        ));
        assert!(matches!(
            uc.execute(&miner, Some("")).await,
            Err(ReputationError::NameMissing)
        ));
        assert!(matches!(
            uc.execute(&miner, Some(&"x".repeat(40))).await,
            Err(ReputationError::NameInvalid(_))
        ));
    }

    #[tokio::test]
    async fn test_name_uniqueness() {
        let (uc, repo) = use_case();
        let alice = MinerId::from("10.0.0.1");
        let bob = MinerId::from("10.0.0.2");

        uc.execute(&alice, Some("seedhunter")).await.unwrap();
        // same owner may claim again
        uc.execute(&alice, Some("seedhunter")).await.unwrap();

        assert!(matches!(
            uc.execute(&bob, Some("seedhunter")).await,
            Err(ReputationError::NameTaken)
        ));

        // renaming frees the old name
        uc.execute(&alice, Some("renamed")).await.unwrap();
        uc.execute(&bob, Some("seedhunter")).await.unwrap();

        let alice_row = repo.find(&alice).await.unwrap().unwrap();
        assert_eq!(alice_row.name.unwrap().as_str(), "renamed");
    }
}

#[cfg(test)]
mod leaderboard_tests {
    use crate::application::config::ReputationConfig;
    use crate::application::{LeaderboardUseCase, SetNameUseCase};
    use crate::domain::repository::MinerRepository;
    use crate::domain::value_object::MinerId;
    use crate::infra::memory::MemoryMinerRepository;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_top_five_positive_scores() {
        let repo = Arc::new(MemoryMinerRepository::new());
        let config = Arc::new(ReputationConfig::default());

        for (i, score) in [10, 50, -3, 0, 20, 40, 30, 5].iter().enumerate() {
            repo.adjust_score(&MinerId::new(format!("10.0.0.{i}")), *score)
                .await
                .unwrap();
        }
        SetNameUseCase::new(repo.clone(), config.clone())
            .execute(&MinerId::from("10.0.0.1"), Some("top"))
            .await
            .unwrap();

        let board = LeaderboardUseCase::new(repo, config).execute().await.unwrap();

        let scores: Vec<i64> = board.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![50, 40, 30, 20, 10]);
        assert_eq!(board[0].name, "top");
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].name, "anonymous");
    }
}

#[cfg(test)]
mod http_tests {
    use crate::domain::entity::Miner;
    use crate::domain::repository::MinerRepository;
    use crate::domain::value_object::{MinerId, MinerName};
    use crate::error::{BANNED_REPLY, ReputationError, ReputationResult};
    use crate::infra::memory::MemoryMinerRepository;
    use crate::presentation::middleware::BANNED_HEADER;
    use crate::{ReputationConfig, reputation_router_generic, with_ban_filter};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn request(uri: &str, ip: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_setname_replies() {
        let repo = MemoryMinerRepository::new();
        let app = reputation_router_generic(repo, ReputationConfig::default());

        let res = app.clone().oneshot(request("/setname", "10.0.0.1")).await.unwrap();
        assert_eq!(body_text(res).await, "specify a name");

        let res = app
            .clone()
            .oneshot(request("/setname?name=miner1", "10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_text(res).await, "success");

        let res = app
            .oneshot(request("/setname?name=miner1", "10.0.0.2"))
            .await
            .unwrap();
        assert_eq!(body_text(res).await, "name taken");
    }

    #[tokio::test]
    async fn test_banned_identity_rejected() {
        let repo = MemoryMinerRepository::new();
        repo.set_banned(&MinerId::from("10.6.6.6"), true);

        let app = with_ban_filter(
            reputation_router_generic(repo.clone(), ReputationConfig::default()),
            Arc::new(repo),
        );

        let res = app
            .clone()
            .oneshot(request("/leaderboard", "10.6.6.6"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(res.headers()[BANNED_HEADER], "true");
        assert_eq!(body_text(res).await, BANNED_REPLY);

        let res = app.oneshot(request("/leaderboard", "10.0.0.1")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_text(res).await, r#"{"miners":[]}"#);
    }

    #[derive(Clone)]
    struct BrokenRepository;

    impl MinerRepository for BrokenRepository {
        async fn find(&self, _id: &MinerId) -> ReputationResult<Option<Miner>> {
            Err(ReputationError::Internal("offline".into()))
        }

        async fn is_banned(&self, _id: &MinerId) -> ReputationResult<bool> {
            Err(ReputationError::Internal("offline".into()))
        }

        async fn adjust_score(&self, _id: &MinerId, _delta: i64) -> ReputationResult<i64> {
            Err(ReputationError::Internal("offline".into()))
        }

        async fn claim_name(&self, _id: &MinerId, _name: &MinerName) -> ReputationResult<bool> {
            Err(ReputationError::Internal("offline".into()))
        }

        async fn leaderboard(&self, _limit: usize) -> ReputationResult<Vec<Miner>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_ban_filter_fails_open() {
        let app = with_ban_filter(
            reputation_router_generic(BrokenRepository, ReputationConfig::default()),
            Arc::new(BrokenRepository),
        );

        let res = app.clone().oneshot(request("/leaderboard", "10.0.0.1")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app
            .oneshot(request("/setname?name=x", "10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(res).await, "error");
    }
}

/// 連続したポーリング失敗に対するエスカレーション方針
pub trait IFailurePolicy: Send {
    /// trueを返した場合、ループを停止する。
    fn check(&self) -> bool;
    fn reset(&mut self);
    fn update(&mut self);
    fn limit(&self) -> Option<usize>;
}

/// 失敗を何度でも許容する。ブローカークライアントの自動復旧に任せる。
#[derive(Default)]
pub struct UnlimitedFailurePolicy;

impl IFailurePolicy for UnlimitedFailurePolicy {
    fn check(&self) -> bool {
        false
    }

    fn reset(&mut self) {
        // noop
    }

    fn update(&mut self) {
        // noop
    }

    fn limit(&self) -> Option<usize> {
        None
    }
}

pub struct ConsecutiveFailurePolicy {
    limit: usize,
    count: usize,
}

impl ConsecutiveFailurePolicy {
    pub fn new(limit: usize) -> Self {
        Self { limit, count: 0 }
    }
}

impl IFailurePolicy for ConsecutiveFailurePolicy {
    fn check(&self) -> bool {
        self.count >= self.limit
    }

    fn reset(&mut self) {
        self.count = 0;
    }

    fn update(&mut self) {
        self.count += 1;
    }

    fn limit(&self) -> Option<usize> {
        Some(self.limit)
    }
}

/// `limit`が0の場合は[UnlimitedFailurePolicy]を返す。
pub fn from_limit(limit: usize) -> Box<dyn IFailurePolicy> {
    match limit {
        0 => Box::new(UnlimitedFailurePolicy),
        limit => Box::new(ConsecutiveFailurePolicy::new(limit)),
    }
}

/// One predicted pose.  `s` is the distance travelled from the current
/// position along the predicted path.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrajectorySample {
    /// Absolute scenario time, seconds.
    pub t:     f64,
    pub x:     f64,
    pub y:     f64,
    pub theta: f64,
    pub v:     f64,
    pub a:     f64,
    pub s:     f64,
}

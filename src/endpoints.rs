//! Known API endpoint paths.

/// API root, answers when the service is up.
pub const HEALTH_CHECK_ENDPOINT: &str = "/";
/// All leagues.
pub const LIST_LEAGUES_ENDPOINT: &str = "/v0/leagues/";
/// All players, paged with `skip`/`limit`.
pub const LIST_PLAYERS_ENDPOINT: &str = "/v0/players/";
/// Weekly player scoring performances.
pub const LIST_PERFORMANCES_ENDPOINT: &str = "/v0/performances/";
/// All teams.
pub const LIST_TEAMS_ENDPOINT: &str = "/v0/teams/";
/// All scoring weeks.
pub const LIST_WEEKS_ENDPOINT: &str = "/v0/weeks/";
/// Record counts for leagues, teams and players.
pub const GET_COUNTS_ENDPOINT: &str = "/v0/counts/";

/// One of the known endpoints, selectable by name on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Endpoint {
    Health,
    Leagues,
    Players,
    Performances,
    Teams,
    Weeks,
    Counts,
}

impl Endpoint {
    /// Every endpoint, in declaration order.
    pub const ALL: [Endpoint; 7] = [
        Endpoint::Health,
        Endpoint::Leagues,
        Endpoint::Players,
        Endpoint::Performances,
        Endpoint::Teams,
        Endpoint::Weeks,
        Endpoint::Counts,
    ];

    /// Returns the path relative to the base URL.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Health => HEALTH_CHECK_ENDPOINT,
            Endpoint::Leagues => LIST_LEAGUES_ENDPOINT,
            Endpoint::Players => LIST_PLAYERS_ENDPOINT,
            Endpoint::Performances => LIST_PERFORMANCES_ENDPOINT,
            Endpoint::Teams => LIST_TEAMS_ENDPOINT,
            Endpoint::Weeks => LIST_WEEKS_ENDPOINT,
            Endpoint::Counts => GET_COUNTS_ENDPOINT,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

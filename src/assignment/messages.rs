//! Comment bodies posted by the arbitrator.

pub fn confirmation(winner: &str) -> String {
    format!(
        "@{winner} Thank you for your interest! I've assigned this issue to you. \
         Feel free to ask any questions if you need clarification. \
         Looking forward to your contribution! 🚀"
    )
}

pub fn decline(candidate: &str, winner: &str) -> String {
    format!(
        "@{candidate} Thank you so much for your interest in working on this issue! \
         I really appreciate your willingness to contribute. \
         However, this issue has been assigned to @{winner} based on their engagement. \
         Please feel free to check out other open issues where you can contribute. \
         Your participation in this project is valued! 🙏"
    )
}

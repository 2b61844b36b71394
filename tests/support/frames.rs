use handsign::landmarks::{DetectionFrame, Hand, LANDMARKS_PER_HAND, LandmarkPoint};

/// Hand whose landmarks all sit near `center`, spread along a diagonal.
pub fn hand_at(center: f32) -> Hand {
    let points: Vec<LandmarkPoint> = (0..LANDMARKS_PER_HAND)
        .map(|idx| {
            let offset = idx as f32 * 0.005;
            LandmarkPoint::new(center + offset, center - offset, offset)
        })
        .collect();
    Hand::from_points(&points).expect("21 landmarks")
}

pub fn one_hand(center: f32) -> DetectionFrame {
    DetectionFrame::new(vec![hand_at(center)])
}

pub fn two_hands(left: f32, right: f32) -> DetectionFrame {
    DetectionFrame::new(vec![hand_at(left), hand_at(right)])
}

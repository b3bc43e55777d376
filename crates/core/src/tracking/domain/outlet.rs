/// Which half of the channel an object left through.
///
/// Assigned once, when the object leaves the alive set, from its last
/// top-left y coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OutletClassification {
    #[default]
    Unclassified,
    /// Last seen above the midline.
    Responsive,
    /// Last seen on or below the midline.
    NonResponsive,
}

impl OutletClassification {
    /// `y < height / 2` with the half floored, so for odd heights the
    /// middle row already belongs to the lower half.
    pub fn classify(y: i32, frame_height: u32) -> Self {
        if i64::from(y) < i64::from(frame_height / 2) {
            Self::Responsive
        } else {
            Self::NonResponsive
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Unclassified => None,
            Self::Responsive => Some(true),
            Self::NonResponsive => Some(false),
        }
    }

    pub fn is_classified(&self) -> bool {
        !matches!(self, Self::Unclassified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::top(0, 100, OutletClassification::Responsive)]
    #[case::just_above(49, 100, OutletClassification::Responsive)]
    #[case::on_midline(50, 100, OutletClassification::NonResponsive)]
    #[case::bottom(99, 100, OutletClassification::NonResponsive)]
    #[case::odd_height_above_floor(4, 11, OutletClassification::Responsive)]
    #[case::odd_height_middle_row(5, 11, OutletClassification::NonResponsive)]
    #[case::odd_height_below_half(6, 11, OutletClassification::NonResponsive)]
    #[case::odd_tall_middle_row(50, 101, OutletClassification::NonResponsive)]
    #[case::negative_y(-3, 10, OutletClassification::Responsive)]
    fn test_classify_boundary(
        #[case] y: i32,
        #[case] height: u32,
        #[case] expected: OutletClassification,
    ) {
        assert_eq!(OutletClassification::classify(y, height), expected);
    }

    #[test]
    fn test_flags() {
        assert_eq!(OutletClassification::Unclassified.as_flag(), None);
        assert_eq!(OutletClassification::Responsive.as_flag(), Some(true));
        assert_eq!(OutletClassification::NonResponsive.as_flag(), Some(false));
        assert!(!OutletClassification::default().is_classified());
    }
}
